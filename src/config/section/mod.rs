//! Configuration section definitions.
//!
//! Each module corresponds to a section in `locator.toml`:
//!
//! | Module     | TOML Section      | Purpose                          |
//! |------------|-------------------|----------------------------------|
//! | `data`     | `[data]`          | Artifact directory, build record |
//! | `location` | `[[locations]]`   | Locations and their sources      |
//! | `serve`    | `[serve]`         | Lookup server                    |

mod data;
mod location;
mod serve;

pub use data::DataConfig;
pub use location::LocationConfig;
pub(crate) use location::validate_locations;
pub use serve::ServeConfig;

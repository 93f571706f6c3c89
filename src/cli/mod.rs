//! Command-line interface module.

mod args;
pub mod index;
pub mod locate;
pub mod serve;

pub use args::{Cli, Commands};

//! Call number lookups.
//!
//! [`Resolver`] reads a location's artifacts on each call; [`LocationCache`]
//! loads every location once and answers from memory. Both produce the
//! same [`LocateResult`] for the same data.

mod cache;
mod resolver;
mod result;
mod search;

pub use cache::LocationCache;
pub use resolver::{Resolver, location_key};
pub use result::{LocateResult, NotLocatedReason};

//! Small shared helpers.

pub mod date;
pub mod mtime;
pub mod path;

//! Network and filesystem I/O.

pub mod download;
pub mod extract;
pub mod sweep;

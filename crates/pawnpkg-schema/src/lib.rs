//! Shared types for the pawnpkg workspace.
//!
//! Nothing in this crate performs I/O. It defines the identifiers callers
//! pass in, the classified artifacts the engine moves around, and the JSON
//! records returned by the source host's REST API.

pub mod artifact;
pub mod github;
pub mod types;

// Re-exports
pub use artifact::*;
pub use github::{ContentEntry, ContentType, Release, ReleaseAsset};
pub use types::*;

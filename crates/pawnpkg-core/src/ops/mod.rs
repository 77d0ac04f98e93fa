//! High-level operations.
//!
//! - [`acquire`]: walk the fallback ladder and place what it yields.
//! - [`install`]: acquire, then record in the ledger and manifest.
//! - [`place`]: destination rules and the per-run placement engine.

pub mod acquire;
pub mod context;
pub mod error;
pub mod install;
pub mod place;

pub use acquire::{AcquisitionResult, acquire, acquire_package};
pub use context::Context;
pub use error::{AcquireError, FailureKind, SourceFailure};
pub use install::{InstallOutcome, install_package};
pub use place::{DestinationRoots, PlacedArtifact};

//! pawnpkg core library.
//!
//! Acquires plugins and include files for a Pawn project from remote sources
//! and places them into the project tree.
//!
//! # Pipeline
//!
//! ```text
//! identifier --resolve--> ladder of rungs --acquire--> fetch --> extract
//!            --> classify --> place --> ledger / manifest
//! ```
//!
//! - [`resolver`] turns an identifier into an ordered ladder of source rungs.
//! - [`ops::acquire`] walks the ladder, stopping where each rung says to.
//! - [`io::extract`] unpacks archives into in-memory entries.
//! - [`classify`] decides what each file is.
//! - [`ops::place`] decides where it goes and writes it once per run.
//! - [`store`] records installed identifiers and updates `pawn-package.json`.

pub mod classify;
pub mod config;
pub mod io;
pub mod ops;
pub mod paths;
pub mod registry;
pub mod reporter;
pub mod resolver;
pub mod store;

pub use config::Config;
pub use ops::acquire::{AcquisitionResult, acquire_package};
pub use ops::context::Context;
pub use ops::error::AcquireError;
pub use ops::place::DestinationRoots;
pub use paths::*;
pub use reporter::{NullReporter, Reporter};

/// User Agent string for every HTTP request.
pub const USER_AGENT: &str = concat!("pawnpkg/", env!("CARGO_PKG_VERSION"));

//! Domain-specific errors for acquisition

use std::fmt;

use pawnpkg_schema::IdentifierError;
use serde::Serialize;
use thiserror::Error;

use crate::io::download::SourceError;
use crate::io::extract::ExtractError;
use crate::ops::place::PlaceError;
use crate::resolver::RungKind;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Archive decode failed for '{name}': {reason}")]
    ArchiveDecode { name: String, reason: String },

    #[error("No source found for {identifier} after {} rungs", .rungs_attempted.len())]
    NoSourceFound {
        identifier: String,
        rungs_attempted: Vec<RungKind>,
        errors: Vec<SourceFailure>,
    },

    #[error("Destination unwritable: {0}")]
    DestinationUnwritable(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Acquisition cancelled")]
    Cancelled,

    #[error("Failed to prepare staging directory: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Failed to record installation: {0}")]
    Ledger(#[from] StoreError),
}

impl AcquireError {
    /// The taxonomy bucket of a per-candidate failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ArchiveDecode { .. } => FailureKind::ArchiveDecode,
            Self::DestinationUnwritable(_) => FailureKind::DestinationUnwritable,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
            _ => FailureKind::SourceUnavailable,
        }
    }
}

impl From<SourceError> for AcquireError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::MalformedResponse { .. } => Self::MalformedResponse(err.to_string()),
            other => Self::SourceUnavailable(other.to_string()),
        }
    }
}

impl From<ExtractError> for AcquireError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Decode { name, reason } => Self::ArchiveDecode { name, reason },
            ExtractError::Io(e) => Self::ArchiveDecode {
                name: String::new(),
                reason: e.to_string(),
            },
        }
    }
}

impl From<PlaceError> for AcquireError {
    fn from(err: PlaceError) -> Self {
        Self::DestinationUnwritable(err.to_string())
    }
}

/// Classification of a recovered, per-candidate failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SourceUnavailable,
    ArchiveDecode,
    DestinationUnwritable,
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SourceUnavailable => "source unavailable",
            Self::ArchiveDecode => "archive decode",
            Self::DestinationUnwritable => "destination unwritable",
            Self::MalformedResponse => "malformed response",
        })
    }
}

/// A failure that was caught and did not stop the acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub rung: RungKind,
    /// Candidate label, asset name or URL.
    pub source: String,
    pub kind: FailureKind,
    pub message: String,
}

impl SourceFailure {
    pub fn new(rung: RungKind, source: impl Into<String>, err: &AcquireError) -> Self {
        Self {
            rung,
            source: source.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.rung, self.source, self.message)
    }
}

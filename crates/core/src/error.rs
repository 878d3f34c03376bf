//! Error types for model assembly.
//!
//! Uses `thiserror` for ergonomic error definitions. There are only two ways
//! a run can fail: a required fragment is missing, or the filesystem refused
//! a read or write.

use std::path::PathBuf;
use thiserror::Error;

use crate::fragment::Role;

/// The top-level error type for all stanblocks operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required fragment file does not exist.
    #[error("Missing {role} fragment: {location} not found")]
    MissingFragment { role: Role, location: String },

    /// Any other read or write failure, surfaced untouched.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is the "fragment file not found" case.
    pub fn is_missing_fragment(&self) -> bool {
        matches!(self, Self::MissingFragment { .. })
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

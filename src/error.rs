//! Error handling for the netdyn pipeline engine.
//!
//! Every failure kind maps to one variant of [`Error`]. A close signal is
//! not an error — graceful shutdown is handled as control flow by the graph,
//! never through this type.

use crate::pipeline::role::Role;
use thiserror::Error;

/// Main error type for netdyn operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete declarative document, reference to an
    /// undeclared pipe name, unknown type locator, or a cyclic topology.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An edge violates the destination's accepted-role contract.
    #[error("Link error: pipe '{pipe}' has role {role:?}, upstream accepts only {allowed:?}")]
    Link {
        pipe: String,
        role: Role,
        allowed: &'static [Role],
    },

    /// A driving loop was invoked before `link`.
    #[error("Link error: pipe '{0}' must be linked before it can be driven")]
    Unlinked(String),

    /// A packet failed verification at a link boundary.
    #[error("Schema error in packet from '{pipe}': field '{field}': {detail}")]
    Schema {
        pipe: String,
        field: &'static str,
        detail: String,
    },

    /// A transform or production routine failed internally.
    #[error("Processing error in '{pipe}': {detail}")]
    Processing { pipe: String, detail: String },

    /// IO errors (lineage persistence, sink files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a processing failure inside a named pipe.
    pub fn processing(pipe: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Processing {
            pipe: pipe.into(),
            detail: detail.into(),
        }
    }
}

/// Result type alias for netdyn operations.
pub type Result<T> = std::result::Result<T, Error>;

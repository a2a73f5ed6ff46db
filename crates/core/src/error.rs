//! Path validation errors.

use thiserror::Error;

/// Reasons a requested content path is rejected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("namespace not allowed for {class} content")]
    NamespaceNotAllowed { class: &'static str },

    #[error("invalid filename: {0}")]
    InvalidFilename(String),
}

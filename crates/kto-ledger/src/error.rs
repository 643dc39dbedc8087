//! Store error type.

use thiserror::Error;

/// Coarse classification of a store failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before any mutation.
    Validation,
    /// Unknown asset, entry or rate.
    Lookup,
    /// Arithmetic result does not fit.
    Overflow,
    /// Persisted data is inconsistent.
    Invariant,
    /// Reading or writing the ledger file failed.
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    Lookup(String),

    #[error("overflow: {0}")]
    Overflow(String),

    #[error("ledger invariant violated: {0}")]
    Invariant(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Lookup(_) => ErrorKind::Lookup,
            Error::Overflow(_) => ErrorKind::Overflow,
            Error::Invariant(_) => ErrorKind::Invariant,
            Error::Io(_) | Error::Json(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn lookup(msg: impl Into<String>) -> Self {
        Error::Lookup(msg.into())
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Error::Invariant(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

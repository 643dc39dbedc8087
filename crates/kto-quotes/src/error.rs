use std::path::PathBuf;

use thiserror::Error;

/// Failure fetching or applying quotes.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("cannot read quote snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed quote snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The upstream service answered with an error.
    #[error("quote service {service}: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    #[error(transparent)]
    Ledger(#[from] kto_ledger::Error),
}

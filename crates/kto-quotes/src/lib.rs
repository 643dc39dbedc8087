//! kto-quotes
//!
//! Market data entering the ledger from outside:
//! - [`QuoteService`]: async source of daily quotes and exchange rates
//! - [`update_quotes`]: fetch for current holdings and append as entries
//! - [`import`]: depot holdings from CSV exports

mod error;
mod service;
mod update;

pub mod import;

pub use error::QuoteError;
pub use service::{FileQuoteService, FxQuote, Quote, QuoteService, QuoteSnapshot};
pub use update::{entries_from_quotes, update_quotes, QuoteUpdate};

//! kto-ledger
//!
//! Append-only ledger of asset and account transactions:
//! - fixed-point `Micros` arithmetic
//! - asset catalog with a static asset-type registry
//! - validating store with sequence numbers and JSON persistence
//! - point-in-time position projection with FIFO lots
//! - exchange-rate index
//! - maturity earnings and internal rate of return
//!
//! Pure in-memory logic; the only I/O is `Store::load` / `Store::save`.

mod error;
mod micros;
mod model;
mod registry;
mod shared;
mod store;

pub mod position;
pub mod rates;
pub mod yields;

pub use error::{Error, ErrorKind, Result};
pub use micros::{Micros, MicrosParseError};
pub use model::{
    is_currency_code, is_zero_date, Asset, EntryType, InterestPaymentSchedule, Ledger,
    LedgerEntry, LedgerHeader,
};
pub use position::{AssetPosition, AssetPositionItem};
pub use rates::{RateError, RateIndex};
pub use registry::{AssetType, AssetTypeInfo, Category};
pub use shared::SharedStore;
pub use store::{Store, Valuation};
pub use yields::{internal_rate_of_return, total_earnings_at_maturity};

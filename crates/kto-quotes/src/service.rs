//! Quote service boundary.
//!
//! A [`QuoteService`] answers two questions for a given day: the closing
//! price of each requested symbol, and the rate of each requested currency
//! against a base currency. Services return the most recent value known at
//! or before the requested day; callers turn the answers into ledger entries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use kto_ledger::Micros;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QuoteError;

/// Closing price of one symbol on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: Micros,
    /// Currency of `price`. Empty when the service does not say.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub currency: String,
}

/// One unit of `base` buys `rate` units of `quote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxQuote {
    pub base: String,
    pub quote: String,
    pub date: NaiveDate,
    pub rate: Micros,
}

#[async_trait]
pub trait QuoteService: Send + Sync {
    /// Stable, human-readable name of this service (e.g. `"file"`).
    fn name(&self) -> &'static str;

    /// Latest closing quote at or before `date` for each of `symbols`.
    /// Symbols the service does not know are left out of the result.
    async fn daily_quotes(
        &self,
        symbols: &[String],
        date: NaiveDate,
    ) -> Result<Vec<Quote>, QuoteError>;

    /// Latest `base`/`quote` rate at or before `date` for each of `quotes`.
    async fn exchange_rates(
        &self,
        base: &str,
        quotes: &[String],
        date: NaiveDate,
    ) -> Result<Vec<FxQuote>, QuoteError>;
}

// ---------------------------------------------------------------------------
// In-memory snapshot
// ---------------------------------------------------------------------------

/// Quotes and rates held in memory. Also the on-disk format read by
/// [`FileQuoteService`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    #[serde(default)]
    pub quotes: Vec<Quote>,
    #[serde(default)]
    pub rates: Vec<FxQuote>,
}

impl QuoteSnapshot {
    pub fn latest_quotes(&self, symbols: &[String], date: NaiveDate) -> Vec<Quote> {
        let mut best: BTreeMap<&str, &Quote> = BTreeMap::new();
        for q in &self.quotes {
            if q.date > date || !symbols.iter().any(|s| s.eq_ignore_ascii_case(&q.symbol)) {
                continue;
            }
            let slot = best.entry(q.symbol.as_str()).or_insert(q);
            if q.date > slot.date {
                *slot = q;
            }
        }
        best.into_values().cloned().collect()
    }

    pub fn latest_rates(&self, base: &str, quotes: &[String], date: NaiveDate) -> Vec<FxQuote> {
        let mut best: BTreeMap<&str, &FxQuote> = BTreeMap::new();
        for r in &self.rates {
            if r.date > date || r.base != base || !quotes.iter().any(|c| *c == r.quote) {
                continue;
            }
            let slot = best.entry(r.quote.as_str()).or_insert(r);
            if r.date > slot.date {
                *slot = r;
            }
        }
        best.into_values().cloned().collect()
    }
}

#[async_trait]
impl QuoteService for QuoteSnapshot {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn daily_quotes(
        &self,
        symbols: &[String],
        date: NaiveDate,
    ) -> Result<Vec<Quote>, QuoteError> {
        Ok(self.latest_quotes(symbols, date))
    }

    async fn exchange_rates(
        &self,
        base: &str,
        quotes: &[String],
        date: NaiveDate,
    ) -> Result<Vec<FxQuote>, QuoteError> {
        Ok(self.latest_rates(base, quotes, date))
    }
}

// ---------------------------------------------------------------------------
// File-backed service
// ---------------------------------------------------------------------------

/// Serves quotes from a JSON [`QuoteSnapshot`] file, re-read on every call
/// so an external job can refresh it between runs.
#[derive(Debug, Clone)]
pub struct FileQuoteService {
    path: PathBuf,
}

impl FileQuoteService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileQuoteService { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<QuoteSnapshot, QuoteError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| QuoteError::Io {
                path: self.path.clone(),
                source,
            })?;
        let snapshot: QuoteSnapshot =
            serde_json::from_str(&raw).map_err(|source| QuoteError::Snapshot {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            path = %self.path.display(),
            quotes = snapshot.quotes.len(),
            rates = snapshot.rates.len(),
            "quote snapshot loaded"
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl QuoteService for FileQuoteService {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn daily_quotes(
        &self,
        symbols: &[String],
        date: NaiveDate,
    ) -> Result<Vec<Quote>, QuoteError> {
        Ok(self.load().await?.latest_quotes(symbols, date))
    }

    async fn exchange_rates(
        &self,
        base: &str,
        quotes: &[String],
        date: NaiveDate,
    ) -> Result<Vec<FxQuote>, QuoteError> {
        Ok(self.load().await?.latest_rates(base, quotes, date))
    }
}

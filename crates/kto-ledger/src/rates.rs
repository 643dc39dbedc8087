//! Exchange-rate time series.
//!
//! Rates are quoted base → quote: a rate of `1.50` for `EUR/CHF` means one
//! EUR buys 1.50 CHF. The index keeps one date-ordered list per quote
//! currency; lookups binary-search for the latest rate on or before a date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::micros::Micros;
use crate::model::LedgerEntry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("no {currency} rate known at or before {date}")]
    NoRate { currency: String, date: NaiveDate },

    #[error("converting {amount} {currency} to base currency overflows")]
    Overflow { amount: Micros, currency: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RatePoint {
    value_date: NaiveDate,
    sequence_num: i64,
    rate: Micros,
}

#[derive(Clone, Debug, Default)]
pub struct RateIndex {
    by_quote: BTreeMap<String, Vec<RatePoint>>,
}

impl RateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every exchange-rate entry in `entries`; other entries are skipped.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        let mut idx = RateIndex::new();
        for e in entries {
            idx.insert(e);
        }
        idx
    }

    /// Insert after every point dated on or before the new one, so equal
    /// dates keep insertion order and the latest insert wins lookups.
    pub fn insert(&mut self, e: &LedgerEntry) {
        if !e.is_exchange_rate() {
            return;
        }
        let Some(value_date) = e.value_date else {
            return;
        };
        let points = self.by_quote.entry(e.quote_currency.clone()).or_default();
        let at = points.partition_point(|p| p.value_date <= value_date);
        points.insert(
            at,
            RatePoint {
                value_date,
                sequence_num: e.sequence_num,
                rate: e.price_micros,
            },
        );
    }

    /// Drop the point added by entry `sequence_num`. Returns whether one was found.
    pub fn remove(&mut self, quote_currency: &str, sequence_num: i64) -> bool {
        let Some(points) = self.by_quote.get_mut(quote_currency) else {
            return false;
        };
        let before = points.len();
        points.retain(|p| p.sequence_num != sequence_num);
        let removed = points.len() != before;
        if points.is_empty() {
            self.by_quote.remove(quote_currency);
        }
        removed
    }

    /// Latest rate for `quote_currency` dated on or before `date`, with its date.
    pub fn rate_at(&self, quote_currency: &str, date: NaiveDate) -> Result<(Micros, NaiveDate), RateError> {
        let no_rate = || RateError::NoRate {
            currency: quote_currency.to_string(),
            date,
        };
        let points = self.by_quote.get(quote_currency).ok_or_else(no_rate)?;
        let i = points.partition_point(|p| p.value_date <= date);
        if i == 0 {
            return Err(no_rate());
        }
        let p = points[i - 1];
        Ok((p.rate, p.value_date))
    }

    /// Convert `amount` in `currency` to `base` at the rate valid on `date`.
    pub fn to_base(
        &self,
        amount: Micros,
        currency: &str,
        base: &str,
        date: NaiveDate,
    ) -> Result<Micros, RateError> {
        if currency == base {
            return Ok(amount);
        }
        let (rate, _) = self.rate_at(currency, date)?;
        amount
            .checked_frac(Micros::UNIT, rate)
            .ok_or_else(|| RateError::Overflow {
                amount,
                currency: currency.to_string(),
            })
    }

    /// Quote currencies with at least one rate.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.by_quote.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_quote.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_quote.is_empty()
    }
}

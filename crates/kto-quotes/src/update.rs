//! Turning fetched quotes into ledger entries.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use kto_ledger::{EntryType, LedgerEntry, Micros, SharedStore, Store};
use tracing::{debug, info, warn};

use crate::error::QuoteError;
use crate::service::{FxQuote, Quote, QuoteService};

/// Outcome of one [`update_quotes`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteUpdate {
    /// Sequence numbers of the appended entries.
    pub added: Vec<i64>,
    /// Entries the store refused.
    pub rejected: usize,
    /// Service requests that failed.
    pub failed_requests: usize,
}

/// Map quotes to `AssetPrice` entries and rates to `ExchangeRate` entries.
///
/// A quote applies to every asset whose quote symbol matches it. Quotes in a
/// currency other than the asset's, rates against another base currency, and
/// values already recorded for the same day are skipped.
pub fn entries_from_quotes(store: &Store, quotes: &[Quote], rates: &[FxQuote]) -> Vec<LedgerEntry> {
    let mut out = Vec::new();

    for q in quotes {
        if q.price <= Micros::ZERO {
            warn!(symbol = %q.symbol, price = %q.price, "ignoring non-positive quote");
            continue;
        }
        let targets = store.assets().iter().filter(|a| {
            a.quote_symbol()
                .is_some_and(|s| s.eq_ignore_ascii_case(&q.symbol))
        });
        for asset in targets {
            if !q.currency.is_empty() && q.currency != asset.currency {
                warn!(
                    symbol = %q.symbol,
                    asset = asset.id(),
                    quote_currency = %q.currency,
                    asset_currency = %asset.currency,
                    "quote currency does not match asset"
                );
                continue;
            }
            if has_entry_on(store, q.date, |e| {
                e.entry_type == EntryType::AssetPrice && e.asset_id == asset.id()
            }) {
                debug!(asset = asset.id(), date = %q.date, "price already recorded");
                continue;
            }
            let mut e = LedgerEntry::new(EntryType::AssetPrice, q.date);
            e.asset_id = asset.id().to_string();
            e.currency = asset.currency.clone();
            e.price_micros = q.price;
            out.push(e);
        }
    }

    for r in rates {
        if r.base != store.base_currency() {
            warn!(
                pair = %format!("{}/{}", r.base, r.quote),
                base = store.base_currency(),
                "ignoring rate against foreign base currency"
            );
            continue;
        }
        if has_entry_on(store, r.date, |e| e.is_exchange_rate() && e.quote_currency == r.quote) {
            debug!(quote = %r.quote, date = %r.date, "rate already recorded");
            continue;
        }
        out.push(LedgerEntry::exchange_rate(r.date, r.base.clone(), r.quote.clone(), r.rate));
    }

    out
}

fn has_entry_on(store: &Store, date: NaiveDate, pred: impl Fn(&LedgerEntry) -> bool) -> bool {
    store
        .entries()
        .iter()
        .any(|e| e.value_date == Some(date) && pred(e))
}

/// Fetch quotes for every asset held at `date` that has a quote symbol, and
/// rates for every non-base currency those holdings use, then append them.
///
/// A failing service request is logged and counted; the other half of the
/// update still runs.
pub async fn update_quotes(
    shared: &SharedStore,
    service: &dyn QuoteService,
    date: NaiveDate,
) -> Result<QuoteUpdate, QuoteError> {
    let (base, symbols, currencies) = shared.read(|store| {
        let held = store.positions_at(date)?;
        let base = store.base_currency().to_string();
        let symbols: BTreeSet<String> = held
            .iter()
            .filter_map(|p| p.asset.quote_symbol().map(str::to_string))
            .collect();
        let currencies: BTreeSet<String> = held
            .iter()
            .map(|p| p.asset.currency.clone())
            .filter(|c| *c != base)
            .collect();
        Ok::<_, kto_ledger::Error>((base, symbols, currencies))
    })?;
    let symbols: Vec<String> = symbols.into_iter().collect();
    let currencies: Vec<String> = currencies.into_iter().collect();

    let mut update = QuoteUpdate::default();

    let quotes = if symbols.is_empty() {
        Vec::new()
    } else {
        match service.daily_quotes(&symbols, date).await {
            Ok(q) => q,
            Err(err) => {
                warn!(service = service.name(), error = %err, "daily quotes request failed");
                update.failed_requests += 1;
                Vec::new()
            }
        }
    };
    let rates = if currencies.is_empty() {
        Vec::new()
    } else {
        match service.exchange_rates(&base, &currencies, date).await {
            Ok(r) => r,
            Err(err) => {
                warn!(service = service.name(), error = %err, "exchange rate request failed");
                update.failed_requests += 1;
                Vec::new()
            }
        }
    };

    let entries = shared.read(|store| entries_from_quotes(store, &quotes, &rates));
    for res in shared.apply_quotes(entries) {
        match res {
            Ok(seq) => update.added.push(seq),
            Err(err) => {
                warn!(error = %err, "quote entry rejected");
                update.rejected += 1;
            }
        }
    }

    info!(
        service = service.name(),
        %date,
        symbols = symbols.len(),
        currencies = currencies.len(),
        added = update.added.len(),
        rejected = update.rejected,
        "quotes updated"
    );
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kto_ledger::{Asset, AssetType};

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn store() -> Store {
        let mut s = Store::new("EUR").unwrap();
        let mut nestle = Asset::new(AssetType::Stock, "Nestle SA", "CHF");
        nestle.isin = "CH0038863350".to_string();
        nestle.ticker_symbol = "NESN.SW".to_string();
        s.add_asset(nestle).unwrap();
        let mut p = LedgerEntry::new(EntryType::AssetPurchase, d("2024-01-02"));
        p.asset_id = "CH0038863350".to_string();
        p.quantity_micros = Micros::from_units(10);
        p.price_micros = Micros::from_units(95);
        p.value_micros = Micros::from_units(950);
        s.add(p).unwrap();
        s
    }

    fn quote(price: i64, currency: &str) -> Quote {
        Quote {
            symbol: "nesn.sw".to_string(),
            date: d("2024-01-05"),
            price: Micros::from_units(price),
            currency: currency.to_string(),
        }
    }

    #[test]
    fn quote_maps_to_price_entry() {
        let s = store();
        let entries = entries_from_quotes(&s, &[quote(98, "CHF")], &[]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, EntryType::AssetPrice);
        assert_eq!(entries[0].asset_id, "CH0038863350");
        assert_eq!(entries[0].price_micros, Micros::from_units(98));
    }

    #[test]
    fn currency_mismatch_and_duplicates_are_skipped() {
        let mut s = store();
        assert!(entries_from_quotes(&s, &[quote(98, "USD")], &[]).is_empty());

        let first = entries_from_quotes(&s, &[quote(98, "")], &[]);
        for e in first {
            s.add(e).unwrap();
        }
        assert!(entries_from_quotes(&s, &[quote(99, "")], &[]).is_empty());
    }

    #[test]
    fn foreign_base_rates_are_skipped() {
        let s = store();
        let rate = |base: &str| FxQuote {
            base: base.to_string(),
            quote: "CHF".to_string(),
            date: d("2024-01-05"),
            rate: Micros::new(940_000),
        };
        assert!(entries_from_quotes(&s, &[], &[rate("USD")]).is_empty());
        let got = entries_from_quotes(&s, &[], &[rate("EUR")]);
        assert_eq!(got.len(), 1);
        assert!(got[0].is_exchange_rate());
    }

    struct FailingService;

    #[async_trait]
    impl QuoteService for FailingService {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn daily_quotes(&self, _: &[String], _: NaiveDate) -> Result<Vec<Quote>, QuoteError> {
            Err(QuoteError::Service {
                service: "failing",
                message: "unavailable".to_string(),
            })
        }

        async fn exchange_rates(
            &self,
            _: &str,
            _: &[String],
            _: NaiveDate,
        ) -> Result<Vec<FxQuote>, QuoteError> {
            Err(QuoteError::Service {
                service: "failing",
                message: "unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn service_failures_are_counted_not_fatal() {
        let shared = SharedStore::new(store());
        let update = update_quotes(&shared, &FailingService, d("2024-01-05")).await.unwrap();
        assert_eq!(update.failed_requests, 2);
        assert!(update.added.is_empty());
        assert_eq!(shared.read(|s| s.entries().len()), 1);
    }
}

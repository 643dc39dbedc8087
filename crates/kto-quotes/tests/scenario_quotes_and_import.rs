//! Scenario: quotes fetched for a foreign-currency holding become price and
//! rate entries that value the depot in the base currency; a later CSV
//! holdings export overrides the position.

use chrono::NaiveDate;
use kto_ledger::{Asset, AssetType, EntryType, LedgerEntry, Micros, SharedStore, Store};
use kto_quotes::import::{read_csv, rows_to_entries, ImportError};
use kto_quotes::{update_quotes, FxQuote, Quote, QuoteSnapshot};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn depot() -> Store {
    let mut s = Store::new("EUR").unwrap();

    let mut nestle = Asset::new(AssetType::Stock, "Nestle SA", "CHF");
    nestle.isin = "CH0038863350".to_string();
    nestle.wkn = "A0Q4DC".to_string();
    nestle.ticker_symbol = "NESN.SW".to_string();
    s.add_asset(nestle).unwrap();

    let mut buy = LedgerEntry::new(EntryType::AssetPurchase, d("2024-01-02"));
    buy.asset_ref = "nestle".to_string();
    buy.quantity_micros = Micros::from_units(10);
    buy.price_micros = Micros::from_units(95);
    buy.value_micros = Micros::from_units(950);
    s.add(buy).unwrap();
    s
}

fn snapshot() -> QuoteSnapshot {
    QuoteSnapshot {
        quotes: vec![Quote {
            symbol: "NESN.SW".to_string(),
            date: d("2024-01-05"),
            price: Micros::from_units(98),
            currency: "CHF".to_string(),
        }],
        rates: vec![FxQuote {
            base: "EUR".to_string(),
            quote: "CHF".to_string(),
            date: d("2024-01-04"),
            rate: Micros::new(980_000),
        }],
    }
}

#[tokio::test]
async fn update_quotes_values_holding_in_base_currency() {
    let shared = SharedStore::new(depot());

    let before = shared.read(|s| s.total_market_value(d("2024-01-05")).unwrap());
    assert_eq!(before.missing_rates, vec!["CHF".to_string()]);

    let update = update_quotes(&shared, &snapshot(), d("2024-01-05")).await.unwrap();
    assert_eq!(update.added, vec![2, 3]);
    assert_eq!(update.rejected, 0);
    assert_eq!(update.failed_requests, 0);

    let after = shared.read(|s| s.total_market_value(d("2024-01-05")).unwrap());
    assert!(after.missing_rates.is_empty());
    // 10 x 98 CHF at 0.98 CHF per EUR
    assert_eq!(after.total_micros, Micros::from_units(1000));

    // Running again on the same day adds nothing.
    let again = update_quotes(&shared, &snapshot(), d("2024-01-05")).await.unwrap();
    assert!(again.added.is_empty());
    assert_eq!(shared.read(|s| s.entries().len()), 3);
}

#[test]
fn csv_holdings_override_position() {
    let mut store = depot();
    let src = "WKN;Currency;Quantity;Price;Value;Value_Date\n\
               a0q4dc;CHF;12;100;1200;10.01.2024\n";
    let rows = read_csv(src.as_bytes(), b';').unwrap();
    let entries = rows_to_entries(&store, &rows).unwrap();
    assert_eq!(entries.len(), 1);
    for e in entries {
        store.add(e).unwrap();
    }

    let pos = store.position_at("CH0038863350", d("2024-01-10")).unwrap();
    assert_eq!(pos.quantity_micros, Micros::from_units(12));
    assert_eq!(pos.market_value(), Micros::from_units(1200));
}

#[test]
fn csv_rows_must_match_known_assets() {
    let store = depot();
    let src = "wkn,currency,price,quantity,value,value_date\n\
               A0Q4DC,EUR,100,12,1200,2024-01-10\n";
    let rows = read_csv(src.as_bytes(), b',').unwrap();
    assert!(matches!(
        rows_to_entries(&store, &rows),
        Err(ImportError::CurrencyMismatch { .. })
    ));

    let src = "wkn,currency,price,quantity,value,value_date\n\
               XXXXXX,CHF,100,12,1200,2024-01-10\n";
    let rows = read_csv(src.as_bytes(), b',').unwrap();
    assert!(matches!(
        rows_to_entries(&store, &rows),
        Err(ImportError::UnknownWkn { .. })
    ));
}

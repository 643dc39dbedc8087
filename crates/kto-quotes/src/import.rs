//! CSV import of depot holdings.
//!
//! ## Column contract (case-insensitive, order-independent)
//!
//! | Column       | Example        | Notes                                  |
//! |--------------|----------------|----------------------------------------|
//! | `wkn`        | `A0HHQ4`       | Looked up against asset WKNs           |
//! | `currency`   | `CHF`          | Must equal the asset's currency        |
//! | `price`      | `98.50`        | Decimal; `98,50` accepted              |
//! | `quantity`   | `10`           | Decimal                                |
//! | `value`      | `985.00`       | Decimal                                |
//! | `value_date` | `2024-01-05`   | `YYYY-MM-DD` or `DD.MM.YYYY`           |
//!
//! Rows with unparseable fields are logged and skipped. A missing column
//! fails the whole file.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use kto_ledger::{EntryType, LedgerEntry, Micros, Store};
use thiserror::Error;
use tracing::{debug, warn};

const COLUMNS: [&str; 6] = ["wkn", "currency", "price", "quantity", "value", "value_date"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv missing required header column: '{0}'")]
    MissingHeader(&'static str),

    #[error("csv row {row}: cannot parse field '{field}' from value '{raw}'")]
    ParseField {
        row: usize,
        field: &'static str,
        raw: String,
    },

    #[error("row {row}: no asset with WKN {wkn}")]
    UnknownWkn { row: usize, wkn: String },

    #[error("row {row}: asset {wkn} is held in {expected}, row says {found}")]
    CurrencyMismatch {
        row: usize,
        wkn: String,
        expected: String,
        found: String,
    },
}

/// One holding line from a depot export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub wkn: String,
    pub currency: String,
    pub price: Micros,
    pub quantity: Micros,
    pub value: Micros,
    pub value_date: NaiveDate,
}

pub fn read_csv_file(path: &Path, delimiter: u8) -> Result<Vec<ImportRow>, ImportError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_csv(file, delimiter)
}

pub fn read_csv<R: Read>(reader: R, delimiter: u8) -> Result<Vec<ImportRow>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let index = column_index(rdr.headers()?)?;

    let mut out = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        match parse_row(i + 1, &record, &index) {
            Ok(r) => out.push(r),
            Err(err) => warn!(error = %err, "skipping import row"),
        }
    }
    debug!(rows = out.len(), "import csv read");
    Ok(out)
}

/// Map rows to `AssetHolding` entries. Every row must name a known WKN in
/// the asset's currency; otherwise nothing is returned.
pub fn rows_to_entries(store: &Store, rows: &[ImportRow]) -> Result<Vec<LedgerEntry>, ImportError> {
    rows.iter()
        .map(|r| {
            let asset = store.asset_by_wkn(&r.wkn).ok_or_else(|| ImportError::UnknownWkn {
                row: r.row,
                wkn: r.wkn.clone(),
            })?;
            if asset.currency != r.currency {
                return Err(ImportError::CurrencyMismatch {
                    row: r.row,
                    wkn: r.wkn.clone(),
                    expected: asset.currency.clone(),
                    found: r.currency.clone(),
                });
            }
            let mut e = LedgerEntry::new(EntryType::AssetHolding, r.value_date);
            e.asset_id = asset.id().to_string();
            e.currency = r.currency.clone();
            e.price_micros = r.price;
            e.quantity_micros = r.quantity;
            e.value_micros = r.value;
            e.comment = "csv import".to_string();
            Ok(e)
        })
        .collect()
}

fn parse_row(
    row: usize,
    record: &csv::StringRecord,
    index: &HashMap<&'static str, usize>,
) -> Result<ImportRow, ImportError> {
    let get = |name: &'static str| {
        index
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    };
    Ok(ImportRow {
        row,
        wkn: non_empty(row, "wkn", get("wkn"))?.to_ascii_uppercase(),
        currency: non_empty(row, "currency", get("currency"))?.to_ascii_uppercase(),
        price: parse_amount(row, "price", get("price"))?,
        quantity: parse_amount(row, "quantity", get("quantity"))?,
        value: parse_amount(row, "value", get("value"))?,
        value_date: parse_date(row, get("value_date"))?,
    })
}

fn column_index(headers: &csv::StringRecord) -> Result<HashMap<&'static str, usize>, ImportError> {
    let mut index = HashMap::new();
    for name in COLUMNS {
        let i = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
            .ok_or(ImportError::MissingHeader(name))?;
        index.insert(name, i);
    }
    Ok(index)
}

fn non_empty<'a>(row: usize, field: &'static str, raw: &'a str) -> Result<&'a str, ImportError> {
    if raw.is_empty() {
        Err(ImportError::ParseField {
            row,
            field,
            raw: String::new(),
        })
    } else {
        Ok(raw)
    }
}

fn parse_amount(row: usize, field: &'static str, raw: &str) -> Result<Micros, ImportError> {
    let err = || ImportError::ParseField {
        row,
        field,
        raw: raw.to_string(),
    };
    if raw.is_empty() {
        return Ok(Micros::ZERO);
    }
    if let Ok(m) = raw.parse::<Micros>() {
        return Ok(m);
    }
    // Decimal comma without thousands separators.
    if raw.contains(',') && !raw.contains('.') {
        return raw.replace(',', ".").parse().map_err(|_| err());
    }
    Err(err())
}

fn parse_date(row: usize, raw: &str) -> Result<NaiveDate, ImportError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .map_err(|_| ImportError::ParseField {
            row,
            field: "value_date",
            raw: raw.to_string(),
        })
}

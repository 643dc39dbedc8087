//! Ledger entities: assets, entries and the persisted ledger document.
//!
//! Field names follow the on-disk JSON format (PascalCase, empty values
//! omitted). `Micros` fields serialize as quoted decimal strings and dates as
//! `YYYY-MM-DD`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::micros::Micros;
use crate::registry::AssetType;

/// Kind of a ledger entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryType {
    AssetPurchase,
    AssetSale,
    AssetPrice,
    AssetHolding,
    AccountCredit,
    AccountDebit,
    AccountBalance,
    AssetMaturity,
    DividendPayment,
    InterestPayment,
    ExchangeRate,
}

impl EntryType {
    pub const ALL: [EntryType; 11] = [
        EntryType::AssetPurchase,
        EntryType::AssetSale,
        EntryType::AssetPrice,
        EntryType::AssetHolding,
        EntryType::AccountCredit,
        EntryType::AccountDebit,
        EntryType::AccountBalance,
        EntryType::AssetMaturity,
        EntryType::DividendPayment,
        EntryType::InterestPayment,
        EntryType::ExchangeRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::AssetPurchase => "AssetPurchase",
            EntryType::AssetSale => "AssetSale",
            EntryType::AssetPrice => "AssetPrice",
            EntryType::AssetHolding => "AssetHolding",
            EntryType::AccountCredit => "AccountCredit",
            EntryType::AccountDebit => "AccountDebit",
            EntryType::AccountBalance => "AccountBalance",
            EntryType::AssetMaturity => "AssetMaturity",
            EntryType::DividendPayment => "DividendPayment",
            EntryType::InterestPayment => "InterestPayment",
            EntryType::ExchangeRate => "ExchangeRate",
        }
    }

    pub fn parse(s: &str) -> Option<EntryType> {
        EntryType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a fixed-income asset pays its interest.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterestPaymentSchedule {
    #[default]
    Unspecified,
    /// Interest compounds and is paid out at maturity.
    Accrued,
    /// Simple interest paid once a year.
    Annual,
}

impl InterestPaymentSchedule {
    fn is_unspecified(&self) -> bool {
        *self == InterestPaymentSchedule::Unspecified
    }
}

/// A tracked asset. Its identity is [`Asset::id`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Asset {
    #[serde(rename = "Type")]
    pub asset_type: AssetType,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub short_name: String,
    #[serde(rename = "ISIN", default, skip_serializing_if = "String::is_empty")]
    pub isin: String,
    #[serde(rename = "WKN", default, skip_serializing_if = "String::is_empty")]
    pub wkn: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ticker_symbol: String,
    /// Symbol used when asking a quote service for prices, if it differs
    /// from the ticker.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub quote_service_symbol: String,
    #[serde(rename = "IBAN", default, skip_serializing_if = "String::is_empty")]
    pub iban: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_number: String,
    #[serde(rename = "CustomID", default, skip_serializing_if = "String::is_empty")]
    pub custom_id: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<NaiveDate>,
    /// Nominal interest rate (`0.04` for 4%).
    #[serde(rename = "Interest", default, skip_serializing_if = "is_zero_micros")]
    pub interest_micros: Micros,
    #[serde(
        rename = "InterestPayment",
        default,
        skip_serializing_if = "InterestPaymentSchedule::is_unspecified"
    )]
    pub interest_payment_schedule: InterestPaymentSchedule,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl Asset {
    /// Minimal asset with the given type, name and currency; all identifiers
    /// empty.
    pub fn new(asset_type: AssetType, name: impl Into<String>, currency: impl Into<String>) -> Self {
        Asset {
            asset_type,
            name: name.into(),
            short_name: String::new(),
            isin: String::new(),
            wkn: String::new(),
            ticker_symbol: String::new(),
            quote_service_symbol: String::new(),
            iban: String::new(),
            account_number: String::new(),
            custom_id: String::new(),
            currency: currency.into(),
            issue_date: None,
            maturity_date: None,
            interest_micros: Micros::ZERO,
            interest_payment_schedule: InterestPaymentSchedule::Unspecified,
            comment: String::new(),
        }
    }

    /// Identifier of the asset: the first non-empty of IBAN, account number,
    /// ISIN, WKN, ticker symbol and custom ID. Empty if none is set.
    pub fn id(&self) -> &str {
        [
            &self.iban,
            &self.account_number,
            &self.isin,
            &self.wkn,
            &self.ticker_symbol,
            &self.custom_id,
        ]
        .into_iter()
        .find(|s| !s.is_empty())
        .map(|s| s.as_str())
        .unwrap_or("")
    }

    /// Short name if set, else the full name.
    pub fn label(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }

    /// Symbol to request quotes for, if any.
    pub fn quote_symbol(&self) -> Option<&str> {
        [&self.quote_service_symbol, &self.ticker_symbol]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(|s| s.as_str())
    }

    /// All identifier fields, for fuzzy reference matching.
    pub(crate) fn identifiers(&self) -> [&str; 6] {
        [
            &self.iban,
            &self.account_number,
            &self.isin,
            &self.wkn,
            &self.ticker_symbol,
            &self.custom_id,
        ]
    }
}

/// One ledger entry.
///
/// Exactly one of two shapes is used: asset entries reference an asset
/// (`asset_id`, or `asset_ref` on input) and leave `quote_currency` empty;
/// `ExchangeRate` entries carry `currency` (base) and `quote_currency` and no
/// asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LedgerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "is_zero_seq")]
    pub sequence_num: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_date: Option<NaiveDate>,
    #[serde(rename = "Type")]
    pub entry_type: EntryType,
    /// Fuzzy asset reference supplied by callers; resolved and cleared on
    /// append.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asset_ref: String,
    #[serde(rename = "AssetID", default, skip_serializing_if = "String::is_empty")]
    pub asset_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub quote_currency: String,
    #[serde(rename = "Quantity", default, skip_serializing_if = "is_zero_micros")]
    pub quantity_micros: Micros,
    #[serde(rename = "Price", default, skip_serializing_if = "is_zero_micros")]
    pub price_micros: Micros,
    #[serde(rename = "Value", default, skip_serializing_if = "is_zero_micros")]
    pub value_micros: Micros,
    #[serde(rename = "Cost", default, skip_serializing_if = "is_zero_micros")]
    pub cost_micros: Micros,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

fn is_zero_seq(n: &i64) -> bool {
    *n == 0
}

fn is_zero_micros(m: &Micros) -> bool {
    m.is_zero()
}

impl LedgerEntry {
    /// Blank entry of the given type and value date.
    pub fn new(entry_type: EntryType, value_date: NaiveDate) -> Self {
        LedgerEntry {
            created: None,
            sequence_num: 0,
            value_date: Some(value_date),
            entry_type,
            asset_ref: String::new(),
            asset_id: String::new(),
            currency: String::new(),
            quote_currency: String::new(),
            quantity_micros: Micros::ZERO,
            price_micros: Micros::ZERO,
            value_micros: Micros::ZERO,
            cost_micros: Micros::ZERO,
            comment: String::new(),
        }
    }

    /// Exchange-rate entry: one unit of `base` buys `rate` units of `quote`.
    pub fn exchange_rate(
        value_date: NaiveDate,
        base: impl Into<String>,
        quote: impl Into<String>,
        rate: Micros,
    ) -> Self {
        let mut e = LedgerEntry::new(EntryType::ExchangeRate, value_date);
        e.currency = base.into();
        e.quote_currency = quote.into();
        e.price_micros = rate;
        e
    }

    /// Value date of a stored entry. Entries accepted by a store always
    /// carry one; unset dates sort first.
    pub fn date(&self) -> NaiveDate {
        self.value_date.unwrap_or(NaiveDate::MIN)
    }

    pub fn is_exchange_rate(&self) -> bool {
        self.entry_type == EntryType::ExchangeRate
    }

    /// Key grouping entries that describe the same thing: the asset id, or
    /// `BASE/QUOTE` for exchange rates.
    pub fn group_key(&self) -> String {
        if self.is_exchange_rate() {
            format!("{}/{}", self.currency, self.quote_currency)
        } else {
            self.asset_id.clone()
        }
    }

    pub(crate) fn monetary_fields(&self) -> [Micros; 4] {
        [
            self.quantity_micros,
            self.price_micros,
            self.value_micros,
            self.cost_micros,
        ]
    }
}

/// Ledger-wide settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LedgerHeader {
    pub base_currency: String,
}

/// The persisted document: header, asset catalog and entries in append order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ledger {
    pub header: LedgerHeader,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(base_currency: impl Into<String>) -> Self {
        Ledger {
            header: LedgerHeader {
                base_currency: base_currency.into(),
            },
            assets: Vec::new(),
            entries: Vec::new(),
        }
    }
}

/// `true` for dates that were set but carry no information (year 1 or
/// earlier, the zero value of external date encodings).
pub fn is_zero_date(d: NaiveDate) -> bool {
    d.year() <= 1
}

/// `true` if `s` is a three-letter upper-case currency code.
pub fn is_currency_code(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn id_priority() {
        let mut a = Asset::new(AssetType::Stock, "Nestle", "CHF");
        assert_eq!(a.id(), "");
        a.custom_id = "nestle".into();
        assert_eq!(a.id(), "nestle");
        a.ticker_symbol = "NESN".into();
        assert_eq!(a.id(), "NESN");
        a.wkn = "A0Q4DC".into();
        assert_eq!(a.id(), "A0Q4DC");
        a.isin = "CH0038863350".into();
        assert_eq!(a.id(), "CH0038863350");
        a.account_number = "123".into();
        assert_eq!(a.id(), "123");
        a.iban = "CH93 0076 2011 6238 5295 7".into();
        assert_eq!(a.id(), "CH93 0076 2011 6238 5295 7");
    }

    #[test]
    fn entry_json_uses_strings_and_omits_empty() {
        let mut e = LedgerEntry::new(EntryType::AssetPurchase, d("2024-01-02"));
        e.asset_id = "NESN".into();
        e.quantity_micros = Micros::from_units(10);
        e.price_micros = "95.5".parse().unwrap();
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ValueDate": "2024-01-02",
                "Type": "AssetPurchase",
                "AssetID": "NESN",
                "Quantity": "10",
                "Price": "95.50",
            })
        );
        let back: LedgerEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn asset_json_round_trip() {
        let mut a = Asset::new(AssetType::GovernmentBond, "Bund 2032", "EUR");
        a.isin = "DE0001102580".into();
        a.maturity_date = Some(d("2032-02-15"));
        a.interest_micros = "0.04".parse().unwrap();
        a.interest_payment_schedule = InterestPaymentSchedule::Annual;
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["ISIN"], "DE0001102580");
        assert_eq!(json["Interest"], "0.04");
        assert_eq!(json["InterestPayment"], "Annual");
        assert_eq!(json["MaturityDate"], "2032-02-15");
        assert!(json.get("WKN").is_none());
        let back: Asset = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn group_keys() {
        let r = LedgerEntry::exchange_rate(d("2024-01-02"), "EUR", "CHF", Micros::UNIT);
        assert_eq!(r.group_key(), "EUR/CHF");
    }

    #[test]
    fn currency_codes() {
        assert!(is_currency_code("EUR"));
        assert!(!is_currency_code("eur"));
        assert!(!is_currency_code("EURO"));
        assert!(!is_currency_code(""));
    }
}

//! The ledger store: owns the ledger, validates every mutation, keeps the
//! asset-id and exchange-rate indexes in step with the entry list.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::micros::Micros;
use crate::model::{is_currency_code, is_zero_date, Asset, EntryType, Ledger, LedgerEntry};
use crate::position::{self, AssetPosition};
use crate::rates::{RateError, RateIndex};

/// Portfolio value in the base currency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Valuation {
    pub total_micros: Micros,
    /// Currencies of positions left out of the total for lack of a rate.
    pub missing_rates: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Store {
    ledger: Ledger,
    /// Asset id -> index into `ledger.assets`.
    asset_index: BTreeMap<String, usize>,
    rates: RateIndex,
    last_seq: i64,
}

impl Store {
    /// Empty store reporting in `base_currency`.
    pub fn new(base_currency: &str) -> Result<Self> {
        Self::from_ledger(Ledger::new(base_currency))
    }

    /// Take ownership of `ledger`, rebuilding the indexes. Fails if the
    /// ledger is inconsistent.
    pub fn from_ledger(ledger: Ledger) -> Result<Self> {
        if !is_currency_code(&ledger.header.base_currency) {
            return Err(Error::invariant(format!(
                "base currency {:?} is not a three-letter code",
                ledger.header.base_currency
            )));
        }

        let mut asset_index = BTreeMap::new();
        for (i, a) in ledger.assets.iter().enumerate() {
            let id = a.id();
            if id.is_empty() {
                return Err(Error::invariant(format!("asset {:?} has no identifier", a.name)));
            }
            if asset_index.insert(id.to_string(), i).is_some() {
                return Err(Error::invariant(format!("duplicate asset id {id}")));
            }
        }

        let mut seen = BTreeSet::new();
        for e in &ledger.entries {
            if e.value_date.is_none() {
                return Err(Error::invariant(format!("entry {} has no value date", e.sequence_num)));
            }
            if !e.is_exchange_rate() && !asset_index.contains_key(&e.asset_id) {
                return Err(Error::invariant(format!(
                    "entry {} references unknown asset {:?}",
                    e.sequence_num, e.asset_id
                )));
            }
            if !seen.insert(e.sequence_num) {
                return Err(Error::invariant(format!("duplicate sequence number {}", e.sequence_num)));
            }
        }

        let rates = RateIndex::from_entries(&ledger.entries);
        let last_seq = ledger.entries.iter().map(|e| e.sequence_num).max().unwrap_or(0);
        Ok(Store {
            ledger,
            asset_index,
            rates,
            last_seq,
        })
    }

    /// Read a ledger saved with [`Store::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let ledger: Ledger = serde_json::from_slice(&data)?;
        let store = Self::from_ledger(ledger)?;
        info!(
            path = %path.display(),
            assets = store.ledger.assets.len(),
            entries = store.ledger.entries.len(),
            "ledger loaded"
        );
        Ok(store)
    }

    /// Write the ledger as indented JSON. The file is replaced atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(&self.ledger)?;
        data.push(b'\n');
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger.json".to_string());
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));
        fs::write(&tmp, &data)?;
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), entries = self.ledger.entries.len(), "ledger saved");
        Ok(())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn base_currency(&self) -> &str {
        &self.ledger.header.base_currency
    }

    pub fn assets(&self) -> &[Asset] {
        &self.ledger.assets
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.ledger.entries
    }

    pub fn rates(&self) -> &RateIndex {
        &self.rates
    }

    /// Asset with exactly this id.
    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.asset_index.get(id).map(|&i| &self.ledger.assets[i])
    }

    pub fn entry(&self, sequence_num: i64) -> Option<&LedgerEntry> {
        self.ledger.entries.iter().find(|e| e.sequence_num == sequence_num)
    }

    pub fn asset_by_wkn(&self, wkn: &str) -> Option<&Asset> {
        self.ledger
            .assets
            .iter()
            .find(|a| !a.wkn.is_empty() && a.wkn.eq_ignore_ascii_case(wkn))
    }

    pub fn asset_by_ticker(&self, ticker: &str) -> Option<&Asset> {
        self.ledger
            .assets
            .iter()
            .find(|a| !a.ticker_symbol.is_empty() && a.ticker_symbol.eq_ignore_ascii_case(ticker))
    }

    /// Resolve a loose asset reference.
    ///
    /// An exact id wins. Otherwise the reference must match exactly one asset,
    /// either an identifier (ignoring case) or part of its name (ignoring case).
    pub fn find_asset(&self, reference: &str) -> Result<&Asset> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(Error::validation("empty asset reference"));
        }
        if let Some(a) = self.asset(reference) {
            return Ok(a);
        }
        let lower = reference.to_lowercase();
        let matches: Vec<&Asset> = self
            .ledger
            .assets
            .iter()
            .filter(|a| {
                a.identifiers().iter().any(|id| !id.is_empty() && id.eq_ignore_ascii_case(reference))
                    || a.name.to_lowercase().contains(&lower)
            })
            .collect();
        match matches.as_slice() {
            [a] => Ok(a),
            [] => Err(Error::lookup(format!("no asset matches {reference:?}"))),
            many => Err(Error::validation(format!(
                "asset reference {reference:?} is ambiguous: {}",
                many.iter().map(|a| a.id()).collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    /// Register a new asset.
    pub fn add_asset(&mut self, asset: Asset) -> Result<()> {
        let id = asset.id().to_string();
        if id.is_empty() {
            return Err(Error::validation("asset needs at least one identifier"));
        }
        if asset.name.trim().is_empty() {
            return Err(Error::validation(format!("asset {id}: name must not be empty")));
        }
        if !is_currency_code(&asset.currency) {
            return Err(Error::validation(format!(
                "asset {id}: invalid currency {:?}",
                asset.currency
            )));
        }
        for (field, date) in [("issue date", asset.issue_date), ("maturity date", asset.maturity_date)] {
            if date.is_some_and(is_zero_date) {
                return Err(Error::validation(format!("asset {id}: {field} is the zero date")));
            }
        }
        if let (Some(issue), Some(maturity)) = (asset.issue_date, asset.maturity_date) {
            if maturity < issue {
                return Err(Error::validation(format!(
                    "asset {id}: maturity date {maturity} is before issue date {issue}"
                )));
            }
        }
        if self.asset_index.contains_key(&id) {
            return Err(Error::validation(format!("asset {id} already exists")));
        }

        debug!(asset_id = %id, asset_type = %asset.asset_type, "asset added");
        self.asset_index.insert(id, self.ledger.assets.len());
        self.ledger.assets.push(asset);
        Ok(())
    }

    /// Validate and append `entry`, returning its sequence number.
    pub fn add(&mut self, mut entry: LedgerEntry) -> Result<i64> {
        match entry.value_date {
            None => return Err(Error::validation("entry has no value date")),
            Some(d) if is_zero_date(d) => return Err(Error::validation("entry has the zero value date")),
            Some(_) => {}
        }

        if entry.is_exchange_rate() {
            self.check_exchange_rate(&mut entry)?;
        } else {
            self.check_asset_entry(&mut entry)?;
        }

        if entry.created.is_none() {
            entry.created = Some(Utc::now());
        }
        entry.asset_ref.clear();
        self.last_seq += 1;
        entry.sequence_num = self.last_seq;

        debug!(
            seq = entry.sequence_num,
            entry_type = %entry.entry_type,
            key = %entry.group_key(),
            "entry added"
        );
        self.rates.insert(&entry);
        self.ledger.entries.push(entry);
        Ok(self.last_seq)
    }

    fn check_exchange_rate(&self, e: &mut LedgerEntry) -> Result<()> {
        if !is_currency_code(&e.quote_currency) {
            return Err(Error::validation(format!(
                "exchange rate needs a quote currency, got {:?}",
                e.quote_currency
            )));
        }
        if e.price_micros <= Micros::ZERO {
            return Err(Error::validation(format!(
                "exchange rate {} must be positive",
                e.price_micros
            )));
        }
        if !e.quantity_micros.is_zero() || !e.value_micros.is_zero() || !e.cost_micros.is_zero() {
            return Err(Error::validation("exchange rate carries only a price"));
        }
        if !e.asset_id.is_empty() || !e.asset_ref.is_empty() {
            return Err(Error::validation("exchange rate must not reference an asset"));
        }
        if e.currency.is_empty() {
            e.currency = self.base_currency().to_string();
        }
        if e.currency != self.base_currency() {
            return Err(Error::validation(format!(
                "exchange rate base {} differs from ledger base currency {}",
                e.currency,
                self.base_currency()
            )));
        }
        if e.currency == e.quote_currency {
            return Err(Error::validation(format!(
                "exchange rate {}/{} quotes a currency against itself",
                e.currency, e.quote_currency
            )));
        }
        Ok(())
    }

    fn check_asset_entry(&self, e: &mut LedgerEntry) -> Result<()> {
        let asset = if !e.asset_id.is_empty() {
            self.asset(&e.asset_id)
                .ok_or_else(|| Error::lookup(format!("unknown asset id {:?}", e.asset_id)))?
        } else if !e.asset_ref.is_empty() {
            self.find_asset(&e.asset_ref)?
        } else {
            return Err(Error::validation(format!("{} entry needs an asset", e.entry_type)));
        };
        let id = asset.id();

        if !asset.asset_type.info().accepts(e.entry_type) {
            return Err(Error::validation(format!(
                "{} entries are not valid for {} ({})",
                e.entry_type, id, asset.asset_type
            )));
        }
        if e.currency.is_empty() {
            e.currency = asset.currency.clone();
        } else if e.currency != asset.currency {
            return Err(Error::validation(format!(
                "entry currency {} does not match {} currency {}",
                e.currency, id, asset.currency
            )));
        }
        if !e.quote_currency.is_empty() {
            return Err(Error::validation("only exchange rates carry a quote currency"));
        }
        if e.price_micros < Micros::ZERO {
            return Err(Error::validation(format!("price {} must not be negative", e.price_micros)));
        }
        if e.cost_micros < Micros::ZERO {
            return Err(Error::validation(format!("cost {} must not be negative", e.cost_micros)));
        }
        if e.entry_type != EntryType::AssetMaturity && e.monetary_fields().iter().all(|m| m.is_zero()) {
            return Err(Error::validation(format!("{} entry has no amounts", e.entry_type)));
        }
        check_entry_amounts(e)?;

        e.asset_id = id.to_string();
        Ok(())
    }

    /// Remove the entry with `sequence_num`.
    pub fn delete(&mut self, sequence_num: i64) -> Result<LedgerEntry> {
        let i = self
            .ledger
            .entries
            .iter()
            .position(|e| e.sequence_num == sequence_num)
            .ok_or_else(|| Error::lookup(format!("no entry with sequence number {sequence_num}")))?;
        let removed = self.ledger.entries.remove(i);
        if removed.is_exchange_rate() {
            self.rates.remove(&removed.quote_currency, sequence_num);
        }
        debug!(seq = sequence_num, entry_type = %removed.entry_type, "entry deleted");
        Ok(removed)
    }

    /// Position of asset `id` at `date`.
    pub fn position_at(&self, id: &str, date: NaiveDate) -> Result<AssetPosition> {
        let asset = self
            .asset(id)
            .ok_or_else(|| Error::lookup(format!("unknown asset id {id:?}")))?;
        Ok(position::position_at(asset, &self.ledger.entries, date))
    }

    /// Every position with a non-zero market value at `date`, ordered by asset id.
    pub fn positions_at(&self, date: NaiveDate) -> Result<Vec<AssetPosition>> {
        let mut by_asset: BTreeMap<&str, Vec<&LedgerEntry>> = BTreeMap::new();
        for e in &self.ledger.entries {
            if e.asset_id.is_empty() || e.date() > date {
                continue;
            }
            by_asset.entry(e.asset_id.as_str()).or_default().push(e);
        }

        let mut out = Vec::with_capacity(by_asset.len());
        for (id, entries) in by_asset {
            let asset = self
                .asset(id)
                .ok_or_else(|| Error::invariant(format!("entries reference unknown asset {id:?}")))?;
            let pos = position::position_at(asset, entries, date);
            if !pos.market_value().is_zero() {
                out.push(pos);
            }
        }
        Ok(out)
    }

    /// Sum of all market values at `date`, converted to the base currency.
    pub fn total_market_value(&self, date: NaiveDate) -> Result<Valuation> {
        let mut total = Micros::ZERO;
        let mut missing = BTreeSet::new();
        for pos in self.positions_at(date)? {
            match self
                .rates
                .to_base(pos.market_value(), &pos.asset.currency, self.base_currency(), date)
            {
                Ok(v) => {
                    total = total
                        .raw()
                        .checked_add(v.raw())
                        .map(Micros::new)
                        .ok_or_else(|| Error::Overflow("total market value".to_string()))?;
                }
                Err(RateError::NoRate { currency, .. }) => {
                    missing.insert(currency);
                }
                Err(err @ RateError::Overflow { .. }) => return Err(Error::Overflow(err.to_string())),
            }
        }
        Ok(Valuation {
            total_micros: total,
            missing_rates: missing.into_iter().collect(),
        })
    }

    /// Rate for `quote_currency` valid at `date`.
    pub fn rate_at(&self, quote_currency: &str, date: NaiveDate) -> std::result::Result<(Micros, NaiveDate), RateError> {
        self.rates.rate_at(quote_currency, date)
    }

    /// Every entry paired with its asset, in append order.
    pub fn rows(&self) -> Vec<(&LedgerEntry, Option<&Asset>)> {
        self.ledger
            .entries
            .iter()
            .map(|e| (e, self.asset(&e.asset_id)))
            .collect()
    }
}

/// Per-type amount rules. Sale quantities and debit values are positive.
fn check_entry_amounts(e: &LedgerEntry) -> Result<()> {
    let t = e.entry_type;
    let require = |ok: bool, what: &str| {
        if ok {
            Ok(())
        } else {
            Err(Error::validation(format!("{t}: {what}")))
        }
    };
    let no_price_or_quantity = || {
        require(
            e.price_micros.is_zero() && e.quantity_micros.is_zero(),
            "price and quantity must be zero",
        )
    };

    match t {
        EntryType::AssetPurchase | EntryType::AssetSale => {
            require(e.quantity_micros > Micros::ZERO, "quantity must be positive")?;
            require(e.price_micros > Micros::ZERO, "price must be positive")
        }
        EntryType::AssetPrice => {
            require(e.price_micros > Micros::ZERO, "price must be positive")?;
            require(
                e.quantity_micros.is_zero() && e.value_micros.is_zero(),
                "quantity and value must be zero",
            )
        }
        EntryType::AssetHolding => require(e.quantity_micros >= Micros::ZERO, "quantity must not be negative"),
        EntryType::AccountCredit | EntryType::AccountDebit => {
            require(e.value_micros > Micros::ZERO, "value must be positive")?;
            no_price_or_quantity()
        }
        EntryType::AccountBalance => no_price_or_quantity(),
        EntryType::DividendPayment | EntryType::InterestPayment => {
            require(!e.value_micros.is_zero(), "value must not be zero")?;
            no_price_or_quantity()
        }
        EntryType::AssetMaturity => Ok(()),
        EntryType::ExchangeRate => Err(Error::validation("exchange rates carry no asset")),
    }
}

//! Point-in-time position projection.
//!
//! A position is rebuilt from scratch for every (asset, cutoff) pair by
//! folding the asset's entries in `(value date, sequence number)` order.
//! Purchases open lots; sales consume them FIFO.

use chrono::NaiveDate;
use serde::Serialize;

use crate::micros::Micros;
use crate::model::{Asset, EntryType, LedgerEntry};

/// One open lot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssetPositionItem {
    pub value_date: NaiveDate,
    pub quantity_micros: Micros,
    pub price_micros: Micros,
    pub cost_micros: Micros,
}

impl AssetPositionItem {
    /// What was paid for the lot: fees plus quantity × price.
    pub fn purchase_price(&self) -> Micros {
        self.cost_micros + self.quantity_micros * self.price_micros
    }
}

/// Reconstructed state of one asset at a cutoff date. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssetPosition {
    pub asset: Asset,
    pub last_updated: Option<NaiveDate>,
    pub quantity_micros: Micros,
    pub price_micros: Micros,
    pub value_micros: Micros,
    /// Open lots, oldest first.
    pub items: Vec<AssetPositionItem>,
}

impl AssetPosition {
    /// Empty position for `asset`.
    pub fn new(asset: Asset) -> Self {
        AssetPosition {
            asset,
            last_updated: None,
            quantity_micros: Micros::ZERO,
            price_micros: Micros::ZERO,
            value_micros: Micros::ZERO,
            items: Vec::new(),
        }
    }

    /// Apply one entry to the position.
    ///
    /// Sale quantities and debit values are positive and subtracted here.
    pub fn apply_entry(&mut self, e: &LedgerEntry) {
        match e.entry_type {
            EntryType::AssetPurchase => {
                self.quantity_micros += e.quantity_micros;
                self.price_micros = e.price_micros;
                self.items.push(AssetPositionItem {
                    value_date: e.date(),
                    quantity_micros: e.quantity_micros,
                    price_micros: e.price_micros,
                    cost_micros: e.cost_micros,
                });
            }
            EntryType::AssetSale => {
                self.quantity_micros -= e.quantity_micros;
                self.price_micros = e.price_micros;
                self.consume_fifo(e.quantity_micros);
            }
            EntryType::AssetMaturity => {
                self.value_micros = Micros::ZERO;
                self.quantity_micros = Micros::ZERO;
                self.price_micros = Micros::ZERO;
                self.items.clear();
            }
            EntryType::AssetPrice => {
                self.price_micros = e.price_micros;
            }
            EntryType::AccountCredit => {
                self.value_micros += e.value_micros;
            }
            EntryType::AccountDebit => {
                self.value_micros -= e.value_micros;
            }
            EntryType::AccountBalance => {
                self.value_micros = e.value_micros;
            }
            EntryType::AssetHolding => self.apply_holding(e),
            EntryType::DividendPayment | EntryType::InterestPayment | EntryType::ExchangeRate => {}
        }
        self.last_updated = Some(e.date());
    }

    /// A holding statement overrides the tracked quantity when it disagrees;
    /// otherwise it only confirms the position.
    fn apply_holding(&mut self, e: &LedgerEntry) {
        if !e.price_micros.is_zero() {
            self.price_micros = e.price_micros;
        }
        if e.quantity_micros == self.quantity_micros {
            return;
        }
        self.quantity_micros = e.quantity_micros;
        self.value_micros = e.value_micros;
        self.items.clear();
        if e.quantity_micros > Micros::ZERO {
            self.items.push(AssetPositionItem {
                value_date: e.date(),
                quantity_micros: e.quantity_micros,
                price_micros: self.price_micros,
                cost_micros: e.cost_micros,
            });
        }
    }

    fn consume_fifo(&mut self, mut qty: Micros) {
        while qty > Micros::ZERO && !self.items.is_empty() {
            let lot = &mut self.items[0];
            if lot.quantity_micros <= qty {
                qty -= lot.quantity_micros;
                self.items.remove(0);
            } else {
                let remaining = lot.quantity_micros - qty;
                lot.cost_micros = lot.cost_micros.frac(remaining, lot.quantity_micros);
                lot.quantity_micros = remaining;
                qty = Micros::ZERO;
            }
        }
    }

    /// `quantity * price` for quantity-tracked positions, `value` otherwise.
    pub fn market_value(&self) -> Micros {
        if self.quantity_micros.is_zero() {
            self.value_micros
        } else {
            self.quantity_micros * self.price_micros
        }
    }

    /// Sum of the open lots' purchase prices.
    pub fn purchase_price(&self) -> Micros {
        self.items.iter().map(AssetPositionItem::purchase_price).sum()
    }

    pub fn profit_loss(&self) -> Micros {
        self.market_value() - self.purchase_price()
    }
}

/// Project `asset` at `cutoff` from `entries`.
///
/// Entries for other assets and entries dated after `cutoff` are ignored.
/// The fold is stable over `(value date, sequence number)`.
pub fn position_at<'a, I>(asset: &Asset, entries: I, cutoff: NaiveDate) -> AssetPosition
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let id = asset.id();
    let mut relevant: Vec<&LedgerEntry> = entries
        .into_iter()
        .filter(|e| e.asset_id == id && e.date() <= cutoff)
        .collect();
    relevant.sort_by_key(|e| (e.date(), e.sequence_num));

    let mut pos = AssetPosition::new(asset.clone());
    for e in relevant {
        pos.apply_entry(e);
    }
    pos
}

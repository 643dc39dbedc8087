//! Thread-safe handle to a [`Store`].
//!
//! Mutations take the write lock so sequence numbers and indexes move
//! together; readers either run a closure under the read lock or take an
//! owned snapshot.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::model::{Asset, LedgerEntry};
use crate::store::Store;

#[derive(Clone, Debug)]
pub struct SharedStore {
    inner: Arc<RwLock<Store>>,
}

impl SharedStore {
    pub fn new(store: Store) -> Self {
        SharedStore {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn add(&self, entry: LedgerEntry) -> Result<i64> {
        self.inner.write().add(entry)
    }

    pub fn add_asset(&self, asset: Asset) -> Result<()> {
        self.inner.write().add_asset(asset)
    }

    pub fn delete(&self, sequence_num: i64) -> Result<LedgerEntry> {
        self.inner.write().delete(sequence_num)
    }

    /// Saving holds the write lock so no entry lands between serialization
    /// and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.inner.write().save(path)
    }

    /// Append fetched quote entries under one lock. Each entry is validated on
    /// its own; a rejected entry does not stop the rest.
    pub fn apply_quotes(&self, entries: Vec<LedgerEntry>) -> Vec<Result<i64>> {
        let mut store = self.inner.write();
        entries.into_iter().map(|e| store.add(e)).collect()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&self.inner.read())
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> Store {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::micros::Micros;
    use crate::model::EntryType;
    use crate::registry::AssetType;
    use chrono::NaiveDate;
    use std::thread;

    #[test]
    fn concurrent_adds_get_distinct_sequence_numbers() {
        let shared = SharedStore::new(Store::new("EUR").unwrap());
        let mut acc = Asset::new(AssetType::Cash, "Wallet", "EUR");
        acc.custom_id = "wallet".into();
        shared.add_asset(acc).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = shared.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|_| {
                            let mut e = LedgerEntry::new(
                                EntryType::AccountCredit,
                                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                            );
                            e.asset_id = "wallet".into();
                            e.value_micros = Micros::UNIT;
                            s.add(e).unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seqs: Vec<i64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        seqs.sort_unstable();
        assert_eq!(seqs, (1..=200).collect::<Vec<_>>());

        let snap = shared.snapshot();
        let pos = snap
            .position_at("wallet", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .unwrap();
        assert_eq!(pos.market_value(), Micros::from_units(200));
        assert_eq!(shared.read(|s| s.entries().len()), 200);
    }
}

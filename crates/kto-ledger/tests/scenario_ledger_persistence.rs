use chrono::NaiveDate;
use kto_ledger::{
    Asset, AssetType, EntryType, ErrorKind, InterestPaymentSchedule, LedgerEntry, Micros, Store,
};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[test]
fn scenario_save_and_load_preserve_ledger_and_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut s = Store::new("EUR").unwrap();
    let mut bond = Asset::new(AssetType::CorporateBond, "ACME 3.5% 2030", "EUR");
    bond.isin = "XS1234567890".into();
    bond.maturity_date = Some(d("2030-06-30"));
    bond.interest_micros = "0.035".parse().unwrap();
    bond.interest_payment_schedule = InterestPaymentSchedule::Annual;
    s.add_asset(bond).unwrap();

    let mut buy = LedgerEntry::new(EntryType::AssetPurchase, d("2024-01-02"));
    buy.asset_ref = "acme".into();
    buy.quantity_micros = Micros::from_units(5_000);
    buy.price_micros = "0.9875".parse().unwrap();
    buy.comment = "first tranche".into();
    s.add(buy).unwrap();
    s.add(LedgerEntry::exchange_rate(d("2024-01-02"), "EUR", "USD", "1.0950".parse().unwrap()))
        .unwrap();
    s.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"BaseCurrency\": \"EUR\""));
    assert!(text.contains("\"Price\": \"0.9875\""));
    assert!(text.contains("\"ValueDate\": \"2024-01-02\""));
    assert!(!text.contains("AssetRef"));

    let loaded = Store::load(&path).unwrap();
    assert_eq!(loaded.ledger(), s.ledger());
    assert_eq!(loaded.asset("XS1234567890").unwrap().name, "ACME 3.5% 2030");
    assert_eq!(loaded.rate_at("USD", d("2024-02-01")).unwrap().0, "1.095".parse().unwrap());

    let mut loaded = loaded;
    let mut sell = LedgerEntry::new(EntryType::AssetSale, d("2024-03-01"));
    sell.asset_id = "XS1234567890".into();
    sell.quantity_micros = Micros::from_units(1_000);
    sell.price_micros = "0.99".parse().unwrap();
    assert_eq!(loaded.add(sell).unwrap(), 3);
}

#[test]
fn scenario_load_rejects_inconsistent_files() {
    let dir = tempfile::tempdir().unwrap();

    let dup = dir.path().join("dup.json");
    std::fs::write(
        &dup,
        r#"{
  "Header": {"BaseCurrency": "EUR"},
  "Assets": [
    {"Type": "Stock", "Name": "A", "WKN": "123456", "Currency": "EUR"},
    {"Type": "Stock", "Name": "B", "WKN": "123456", "Currency": "EUR"}
  ],
  "Entries": []
}"#,
    )
    .unwrap();
    assert_eq!(Store::load(&dup).unwrap_err().kind(), ErrorKind::Invariant);

    let undated = dir.path().join("undated.json");
    std::fs::write(
        &undated,
        r#"{
  "Header": {"BaseCurrency": "EUR"},
  "Assets": [{"Type": "Stock", "Name": "A", "WKN": "123456", "Currency": "EUR"}],
  "Entries": [{"SequenceNum": 1, "Type": "AssetPrice", "AssetID": "123456", "Price": "1"}]
}"#,
    )
    .unwrap();
    assert_eq!(Store::load(&undated).unwrap_err().kind(), ErrorKind::Invariant);

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{").unwrap();
    assert_eq!(Store::load(&garbage).unwrap_err().kind(), ErrorKind::Io);

    assert_eq!(
        Store::load(&dir.path().join("missing.json")).unwrap_err().kind(),
        ErrorKind::Io
    );
}

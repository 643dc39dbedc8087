use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

fn kto(ledger: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kto").unwrap();
    cmd.env_remove("RUST_LOG").arg("--ledger").arg(ledger);
    cmd
}

fn depot(dir: &Path) -> std::path::PathBuf {
    let ledger = dir.join("ledger.json");
    kto(&ledger).args(["init", "--base-currency", "EUR"]).assert().success();
    kto(&ledger)
        .args([
            "add-asset", "--type", "Stock", "--name", "Nestle SA", "--currency", "CHF",
            "--isin", "CH0038863350", "--wkn", "A0Q4DC", "--ticker", "NESN.SW",
        ])
        .assert()
        .success();
    ledger
}

#[test]
fn import_csv_appends_holdings() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let ledger = depot(dir.path());
    let csv = dir.path().join("depot.csv");
    std::fs::write(
        &csv,
        "WKN;Currency;Quantity;Price;Value;Value_Date\nA0Q4DC;CHF;12;100;1200;10.01.2024\n",
    )?;

    kto(&ledger)
        .args(["import-csv", "--delimiter", ";", "--dry-run"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("dry_run=true rows=1"));

    kto(&ledger)
        .args(["import-csv", "--delimiter", ";"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported=1"));

    kto(&ledger)
        .args(["positions", "--date", "2024-01-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quantity=12 price=100 market_value=1200"))
        .stdout(predicate::str::contains("missing_rates=CHF"));
    Ok(())
}

#[test]
fn update_quotes_from_snapshot_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let ledger = depot(dir.path());
    kto(&ledger)
        .args([
            "add", "--type", "AssetPurchase", "--asset", "CH0038863350", "--date", "2024-01-02",
            "--quantity", "10", "--price", "95",
        ])
        .assert()
        .success();

    let quotes = dir.path().join("quotes.json");
    std::fs::write(
        &quotes,
        r#"{
  "quotes": [{"symbol": "NESN.SW", "date": "2024-01-05", "price": "98", "currency": "CHF"}],
  "rates": [{"base": "EUR", "quote": "CHF", "date": "2024-01-04", "rate": "0.98"}]
}"#,
    )?;

    kto(&ledger)
        .args(["update-quotes", "--date", "2024-01-05", "--file"])
        .arg(&quotes)
        .assert()
        .success()
        .stdout(predicate::str::contains("added=2 rejected=0 failed_requests=0"));

    kto(&ledger)
        .args(["positions", "--date", "2024-01-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("market_value=980"))
        .stdout(predicate::str::contains("total_eur=1000.00"));
    Ok(())
}

#[test]
fn config_hash_is_stable_across_key_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let a = dir.path().join("a.yaml");
    let b = dir.path().join("b.yaml");
    std::fs::write(&a, "ledger:\n  path: x.json\n  base_currency: EUR\n")?;
    std::fs::write(&b, "ledger:\n  base_currency: EUR\n  path: x.json\n")?;

    let out_a = Command::cargo_bin("kto")?.arg("config-hash").arg(&a).output()?;
    let out_b = Command::cargo_bin("kto")?.arg("config-hash").arg(&b).output()?;
    assert!(out_a.status.success());
    assert_eq!(out_a.stdout, out_b.stdout);
    assert!(String::from_utf8(out_a.stdout)?.starts_with("config_hash="));
    Ok(())
}

#[test]
fn ledger_path_comes_from_config() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let ledger = dir.path().join("from-config.json");
    let cfg = dir.path().join("kto.yaml");
    std::fs::write(
        &cfg,
        format!("ledger:\n  path: {}\n  base_currency: CHF\n", ledger.display()),
    )?;

    Command::cargo_bin("kto")?
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&cfg)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("base_currency=CHF"));
    assert!(ledger.exists());
    Ok(())
}

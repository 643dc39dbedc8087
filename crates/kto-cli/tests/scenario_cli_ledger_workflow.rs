use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

fn kto(ledger: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kto").unwrap();
    cmd.env_remove("RUST_LOG").arg("--ledger").arg(ledger);
    cmd
}

/// Build a CHF stock position valued through an EUR/CHF rate, then delete
/// the purchase again.
#[test]
fn cli_ledger_workflow() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let ledger = dir.path().join("ledger.json");

    kto(&ledger)
        .args(["init", "--base-currency", "eur"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base_currency=EUR"));

    kto(&ledger)
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("REFUSING INIT"));

    kto(&ledger)
        .args([
            "add-asset",
            "--type",
            "Stock",
            "--name",
            "Nestle SA",
            "--currency",
            "CHF",
            "--isin",
            "CH0038863350",
            "--ticker",
            "NESN.SW",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("asset_id=CH0038863350"));

    kto(&ledger)
        .args([
            "add", "--type", "AssetPurchase", "--asset", "nestle", "--date", "2024-01-02",
            "--quantity", "10", "--price", "95", "--value", "950",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("sequence_num=1"));

    kto(&ledger)
        .args([
            "add", "--type", "ExchangeRate", "--quote-currency", "CHF", "--price", "0.95",
            "--date", "2024-01-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("sequence_num=2"));

    kto(&ledger)
        .args(["positions", "--date", "2024-01-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("id=CH0038863350"))
        .stdout(predicate::str::contains("market_value=950"))
        .stdout(predicate::str::contains("total_eur=1000.00"));

    kto(&ledger)
        .args(["rate", "chf", "--date", "2024-01-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pair=EUR/CHF rate=0.95 as_of=2024-01-01"));

    kto(&ledger)
        .args(["entries", "--query", "type~purchase"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seq=1 "))
        .stdout(predicate::str::contains("count=1"));

    kto(&ledger)
        .args(["delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted=true sequence_num=1"));

    kto(&ledger)
        .args(["positions", "--date", "2024-01-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("id=").not())
        .stdout(predicate::str::contains("total_eur=0.00"));

    Ok(())
}

#[test]
fn cli_rejects_invalid_entries_without_touching_ledger() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let ledger = dir.path().join("ledger.json");
    kto(&ledger).args(["init"]).assert().success();
    let before = std::fs::read_to_string(&ledger)?;

    kto(&ledger)
        .args(["add", "--type", "AssetPurchase", "--asset", "nothing", "--quantity", "1", "--price", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("add entry"));

    kto(&ledger)
        .args(["entries", "--query", "name:\"unterminated"])
        .assert()
        .failure();

    assert_eq!(std::fs::read_to_string(&ledger)?, before);
    Ok(())
}

#[test]
fn cli_missing_ledger_points_to_init() {
    let dir = tempfile::tempdir().unwrap();
    kto(&dir.path().join("missing.json"))
        .args(["positions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kto init"));
}

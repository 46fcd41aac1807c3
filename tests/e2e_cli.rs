mod cli_helpers;

use assert_cmd::{cargo, prelude::*};
use cli_helpers::{add_transaction, base_cmd, json_decimal, run_cmd, run_cmd_json};
use predicates::prelude::*;
use rust_decimal_macros::dec;
use std::{path::PathBuf, process::Command};
use tempfile::TempDir;

fn setup_temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

#[test]
fn portfolio_show_empty_db_no_ansi_escapes() {
    let home = setup_temp_home();

    let mut cmd = Command::new(cargo::cargo_bin!("tradersan"));
    cmd.env("HOME", home.path());
    cmd.arg("--no-color").arg("portfolio").arg("show");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No open positions"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn import_dry_run_does_not_create_db() {
    let home = setup_temp_home();
    let db_path = PathBuf::from(home.path()).join(".tradersan").join("data.db");

    let mut cmd = base_cmd(&home);
    cmd.arg("import")
        .arg("tests/fixtures/schwab_sample.csv")
        .arg("--dry-run");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Found 3 trades"))
        .stdout(predicate::str::contains("Dry run"));

    assert!(!db_path.exists(), "dry-run should not create db");
}

#[test]
fn import_schwab_then_portfolio_shows_remaining_lot() {
    let home = setup_temp_home();

    run_cmd(&home, &["import", "tests/fixtures/schwab_sample.csv"]).unwrap();

    // After Buy 10 @ $5, Buy 10 @ $8, Sell 15 @ $10: 5 shares @ $8 remain
    let output = run_cmd(&home, &["portfolio", "show"]).unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("ACME"));
    assert!(stdout.contains("$40.00"));
}

#[test]
fn import_twice_skips_duplicates() {
    let home = setup_temp_home();

    let first = run_cmd_json(&home, &["import", "tests/fixtures/schwab_sample.csv"]).unwrap();
    assert_eq!(first["imported"], 3);
    assert_eq!(first["skipped"], 0);

    let second = run_cmd_json(&home, &["import", "tests/fixtures/schwab_sample.csv"]).unwrap();
    assert_eq!(second["imported"], 0);
    assert_eq!(second["skipped"], 3);
}

#[test]
fn import_marcus_format_is_auto_detected() {
    let home = setup_temp_home();

    let result = run_cmd_json(&home, &["import", "tests/fixtures/marcus_sample.csv"]).unwrap();
    assert_eq!(result["broker"], "MARCUS");
    // Dividend and ACH rows are not trades
    assert_eq!(result["imported"], 3);
}

#[test]
fn tax_report_matches_fifo_worked_example() {
    let home = setup_temp_home();

    run_cmd(&home, &["import", "tests/fixtures/schwab_sample.csv"]).unwrap();
    let report = run_cmd_json(&home, &["tax", "report", "2024"]).unwrap();

    assert_eq!(report["year"], 2024);
    let records = report["sales"][0]["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);

    // Oldest lot first: 10 shares held 500 days, long-term at 15%
    assert_eq!(records[0]["term"], "Long");
    assert_eq!(json_decimal(&report, "/sales/0/records/0/gain"), dec!(50));
    assert_eq!(json_decimal(&report, "/sales/0/records/0/tax"), dec!(7.50));

    // Then 5 shares from the newer lot, short-term at 40%
    assert_eq!(records[1]["term"], "Short");
    assert_eq!(json_decimal(&report, "/sales/0/records/1/gain"), dec!(10));
    assert_eq!(json_decimal(&report, "/sales/0/records/1/tax"), dec!(4.00));

    // The $5 fee is charged once, at the sale level
    assert_eq!(json_decimal(&report, "/totals/fees"), dec!(5));
    assert_eq!(json_decimal(&report, "/totals/net_gain"), dec!(55));
    assert_eq!(json_decimal(&report, "/totals/total_tax"), dec!(11.50));
}

#[test]
fn tax_summary_folds_sales_per_security() {
    let home = setup_temp_home();

    run_cmd(&home, &["import", "tests/fixtures/schwab_sample.csv"]).unwrap();
    let summary = run_cmd_json(&home, &["tax", "summary", "2024"]).unwrap();

    let securities = summary["securities"].as_array().unwrap();
    assert_eq!(securities.len(), 1);
    assert_eq!(securities[0]["symbol"], "ACME");
    assert_eq!(json_decimal(&summary, "/securities/0/proceeds"), dec!(150));
    assert_eq!(json_decimal(&summary, "/securities/0/total_tax"), dec!(11.50));
}

#[test]
fn manual_add_and_list_round_trip() {
    let home = setup_temp_home();

    add_transaction(&home, "vti", "buy", "2.5", "217.31", "2024-03-01").unwrap();
    let listed = run_cmd_json(&home, &["transactions", "list"]).unwrap();

    let rows = listed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["symbol"], "VTI");
    assert_eq!(rows[0]["action"], "Buy");
    assert_eq!(json_decimal(&listed, "/0/quantity"), dec!(2.5));
}

#[test]
fn oversell_is_rejected_before_touching_the_ledger() {
    let home = setup_temp_home();

    add_transaction(&home, "ACME", "buy", "5", "10", "2024-01-01").unwrap();

    let mut cmd = base_cmd(&home);
    cmd.args(["transactions", "add", "ACME", "sell", "10", "12", "2024-06-01"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("insufficient holdings"));

    // The rejected sell left no trace
    let listed = run_cmd_json(&home, &["transactions", "list"]).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[test]
fn backdated_sell_cannot_starve_a_later_sell() {
    let home = setup_temp_home();

    add_transaction(&home, "ACME", "buy", "10", "5", "2024-01-01").unwrap();
    add_transaction(&home, "ACME", "sell", "10", "8", "2024-03-01").unwrap();

    // 10 shares were held on 2024-02-01, but the March sell already
    // claims all of them; accepting this would leave the log unreplayable
    let mut cmd = base_cmd(&home);
    cmd.args(["transactions", "add", "ACME", "sell", "5", "7", "2024-02-01"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("insufficient holdings"));

    // The log is still intact and every replay-based report still works
    let listed = run_cmd_json(&home, &["transactions", "list"]).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let report = run_cmd_json(&home, &["tax", "report", "2024"]).unwrap();
    assert_eq!(json_decimal(&report, "/totals/proceeds"), dec!(80));
    run_cmd(&home, &["portfolio", "show"]).unwrap();
}

#[test]
fn backdated_sell_within_remaining_headroom_is_accepted() {
    let home = setup_temp_home();

    add_transaction(&home, "ACME", "buy", "10", "5", "2024-01-01").unwrap();
    add_transaction(&home, "ACME", "sell", "6", "8", "2024-03-01").unwrap();

    // Only 4 shares are free once the March sell is honored
    add_transaction(&home, "ACME", "sell", "4", "7", "2024-02-01").unwrap();

    let report = run_cmd_json(&home, &["tax", "report", "2024"]).unwrap();
    assert_eq!(report["sales"].as_array().unwrap().len(), 2);
}

#[test]
fn portfolio_respects_as_of_date() {
    let home = setup_temp_home();

    add_transaction(&home, "ACME", "buy", "10", "5", "2023-01-10").unwrap();
    add_transaction(&home, "ACME", "buy", "10", "8", "2024-02-14").unwrap();
    add_transaction(&home, "ACME", "sell", "15", "10", "2024-05-24").unwrap();

    // Before the second buy, the whole first lot is still open
    let early = run_cmd_json(&home, &["portfolio", "show", "--at", "2023-06-01"]).unwrap();
    assert_eq!(json_decimal(&early, "/positions/0/shares"), dec!(10));
    assert_eq!(json_decimal(&early, "/positions/0/cost_basis"), dec!(50));

    // After the sale, only 5 shares of the newer lot remain
    let late = run_cmd_json(&home, &["portfolio", "show", "--at", "2024-06-01"]).unwrap();
    assert_eq!(json_decimal(&late, "/positions/0/shares"), dec!(5));
    assert_eq!(json_decimal(&late, "/positions/0/cost_basis"), dec!(40));
}

#[test]
fn custom_db_path_overrides_default_location() {
    let home = setup_temp_home();
    let db_file = home.path().join("elsewhere.db");
    let db_arg = db_file.to_str().unwrap().to_string();

    run_cmd(
        &home,
        &[
            "--db",
            &db_arg,
            "transactions",
            "add",
            "ACME",
            "buy",
            "1",
            "10",
            "2024-01-01",
        ],
    )
    .unwrap();

    assert!(db_file.exists());
    let default_db = PathBuf::from(home.path()).join(".tradersan").join("data.db");
    assert!(!default_db.exists());
}

#[test]
fn config_file_changes_sale_fee_default() {
    let home = setup_temp_home();
    let config_dir = PathBuf::from(home.path()).join(".tradersan");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "sale_fee = 4.95\n").unwrap();

    add_transaction(&home, "ACME", "buy", "10", "5", "2024-01-01").unwrap();
    add_transaction(&home, "ACME", "sell", "2", "6", "2024-02-01").unwrap();

    let listed = run_cmd_json(&home, &["transactions", "list"]).unwrap();
    // Newest first: the sell picked up the configured fee
    assert_eq!(listed[0]["action"], "Sell");
    assert_eq!(json_decimal(&listed, "/0/fee"), dec!(4.95));
}

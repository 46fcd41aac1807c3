#![allow(dead_code)]

use anyhow::{bail, Result};
use assert_cmd::cargo;
use serde_json::Value;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Build a command with an isolated HOME so each test gets a fresh
/// database and config under $HOME/.tradersan
pub fn base_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("tradersan"));
    cmd.env("HOME", home.path());
    cmd.arg("--no-color");
    cmd
}

pub fn run_cmd(home: &TempDir, args: &[&str]) -> Result<Output> {
    let mut cmd = base_cmd(home);
    cmd.args(args);
    let output = cmd.output()?;
    if !output.status.success() {
        bail!(
            "command failed: {:?}\nstdout: {}\nstderr: {}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(output)
}

pub fn run_cmd_json(home: &TempDir, args: &[&str]) -> Result<Value> {
    let mut full_args = vec!["--json"];
    full_args.extend_from_slice(args);
    let output = run_cmd(home, &full_args)?;
    let stdout = String::from_utf8(output.stdout)?;
    Ok(serde_json::from_str(&stdout)?)
}

pub fn add_transaction(
    home: &TempDir,
    symbol: &str,
    action: &str,
    quantity: &str,
    price: &str,
    date: &str,
) -> Result<()> {
    run_cmd(
        home,
        &["transactions", "add", symbol, action, quantity, price, date],
    )?;
    Ok(())
}

/// Parse a decimal out of a JSON field serialized as a string
pub fn json_decimal(value: &Value, pointer: &str) -> rust_decimal::Decimal {
    value
        .pointer(pointer)
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("missing or non-decimal field at {}: {}", pointer, value))
}

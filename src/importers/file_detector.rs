use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::info;

use super::Broker;

/// Detect which broker exported a CSV file based on its header row
///
/// Detection strategy:
/// - Schwab exports carry "Action" and "Symbol" columns
/// - Marcus Invest exports carry "Transaction" and "Desc" columns
/// - Anything else → Error with the headers that were found
pub fn detect_broker<P: AsRef<Path>>(path: P) -> Result<Broker> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("File has no extension"))?
        .to_lowercase();

    if !matches!(extension.as_str(), "csv" | "txt") {
        return Err(anyhow!(
            "Unsupported file extension: {}. Broker exports are plain CSV.",
            extension
        ));
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("Failed to open CSV file for broker detection")?;

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let has = |name: &str| headers.iter().any(|h| h.eq_ignore_ascii_case(name));

    if has("Action") && has("Symbol") {
        info!("Detected Schwab export (Action/Symbol headers)");
        return Ok(Broker::Schwab);
    }

    if has("Transaction") && has("Desc") {
        info!("Detected Marcus Invest export (Transaction/Desc headers)");
        return Ok(Broker::Marcus);
    }

    Err(anyhow!(
        "Could not determine broker from headers: {:?}\n\
         Expected either:\n  \
         - Schwab format with columns: Date, Action, Symbol, Quantity, Price, Amount\n  \
         - Marcus Invest format with columns: Date, Transaction, Desc, Quantity, Price, Credit, Debit",
        headers
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_detects_schwab_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "schwab.csv",
            "\"Date\",\"Action\",\"Symbol\",\"Description\",\"Quantity\",\"Price\",\"Fees & Comm\",\"Amount\"\n",
        );
        assert_eq!(detect_broker(&path).unwrap(), Broker::Schwab);
    }

    #[test]
    fn test_detects_marcus_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "marcus.csv",
            "Date,Transaction,Desc,Quantity,Price,Credit,Debit\n",
        );
        assert_eq!(detect_broker(&path).unwrap(), Broker::Marcus);
    }

    #[test]
    fn test_unknown_headers_fail_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "other.csv", "foo,bar,baz\n");
        let err = detect_broker(&path).unwrap_err();
        assert!(err.to_string().contains("Could not determine broker"));
    }

    #[test]
    fn test_rejects_non_csv_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "trades.xlsx", "ignored");
        assert!(detect_broker(&path).is_err());
    }
}

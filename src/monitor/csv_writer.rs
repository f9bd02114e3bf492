//! CSV writer for monitoring results.
//!
//! Writes history entries to a CSV file in append-only mode for crash safety.
//! Each row contains: session, timestamp, total, percentage, recognized text.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use super::session::SessionEvent;

/// CSV header row.
const CSV_HEADER: &str = "session,timestamp,total,percentage,text";

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Appends one result row to the CSV file.
///
/// Opens the file in append mode for each write, so rows written before a
/// crash are kept.
pub fn append_to_csv(path: &Path, event: &SessionEvent) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    let entry = &event.entry;
    let line = format!(
        "{},{},{},{},{}",
        escape_field(&event.session_id),
        entry.timestamp.format("%Y-%m-%dT%H:%M:%S"),
        entry.fields.total.map(|t| t.to_string()).unwrap_or_default(),
        entry.fields.percentage.map(|p| p.to_string()).unwrap_or_default(),
        escape_field(entry.raw_text.trim()),
    );

    writeln!(file, "{}", line).context("Failed to write CSV row")?;
    Ok(())
}

/// Quotes a field when it contains a delimiter, quote or line break.
fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

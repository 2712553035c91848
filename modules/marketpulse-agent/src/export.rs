//! Flat CSV sheets of shop records: the local copy of a scan and the
//! cloud-table export.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use marketpulse_common::ShopRecord;

/// Write one batch as a CSV sheet, header first.
pub fn write_records_csv(path: &Path, records: &[ShopRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), count = records.len(), "CSV sheet written");
    Ok(())
}

/// Read a CSV sheet back. Malformed rows are skipped with a warning; shape
/// errors stay isolated to the row they occur on.
pub fn read_records_csv(path: &Path) -> Result<Vec<ShopRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<ShopRecord>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => warn!(row = i + 1, error = %e, "Skipping malformed CSV row"),
        }
    }
    info!(path = %path.display(), count = records.len(), "CSV sheet read");
    Ok(records)
}

/// Filename for a fresh scan: `<location-slug>_<YYYYMMDD>.csv`.
pub fn scan_csv_name(location: &str) -> String {
    let slug: String = location
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}.csv", slug, Utc::now().format("%Y%m%d"))
}

/// Filename for a cloud-table export: `cloud_export_<YYYYMMDD_HHMMSS>.csv`.
pub fn cloud_export_name() -> String {
    format!("cloud_export_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"))
}

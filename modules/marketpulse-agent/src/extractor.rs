//! Raw listing → `ShopRecord` normalization with batch-scoped dedup.

use std::collections::HashSet;

use tracing::debug;

use marketpulse_common::{category_from_query, title_case, RawPlace, RecordSource, ShopRecord, UNKNOWN};

/// Normalize one query's raw listings into records.
///
/// `seen_names` lives at batch scope so dedup spans every query of a scan:
/// the first record to claim a name wins and later entries with the same
/// name are dropped, across queries. Titleless entries take the `"unknown"`
/// sentinel as their name and dedup like any other — after the first, every
/// unnamed entry in the batch is a duplicate of the sentinel. That collapse
/// is intentional; downstream consumers key on the name.
pub fn extract_records(
    query: &str,
    entries: Vec<RawPlace>,
    seen_names: &mut HashSet<String>,
    source: RecordSource,
) -> Vec<ShopRecord> {
    let derived_category = category_from_query(query);
    let mut records = Vec::with_capacity(entries.len());

    for entry in entries {
        let name = match entry.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => UNKNOWN.to_string(),
        };

        if !seen_names.insert(name.clone()) {
            debug!(name, query, "Duplicate name, skipping entry");
            continue;
        }

        let category = match entry.category.as_deref().map(str::trim) {
            Some(provided) if !provided.is_empty() => title_case(provided),
            _ => derived_category.clone(),
        };

        records.push(ShopRecord {
            name,
            category,
            rating: entry
                .rating
                .filter(|r| r.is_finite() && (0.0..=5.0).contains(r)),
            review_count: entry
                .reviews
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
            address: text_or_unknown(entry.address),
            phone: text_or_unknown(entry.phone),
            website: text_or_unknown(entry.website),
            open_status: text_or_unknown(entry.open_state),
            source,
        });
    }

    records
}

fn text_or_unknown(value: Option<String>) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => UNKNOWN.to_string(),
    }
}

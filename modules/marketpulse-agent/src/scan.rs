//! Scan orchestrator: runs queries against one provider, strictly in order,
//! and accumulates the normalized record batch.

use std::collections::HashSet;

use tracing::{info, warn};

use marketpulse_common::ShopRecord;

use crate::extractor::extract_records;
use crate::providers::PlaceProvider;

/// Counters for one scan run.
#[derive(Debug, Default)]
pub struct ScanStats {
    pub queries_run: u32,
    pub queries_failed: u32,
    pub raw_entries: u32,
    pub duplicates_skipped: u32,
    pub records_kept: u32,
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Scan Complete ===")?;
        writeln!(f, "Queries run:        {}", self.queries_run)?;
        writeln!(f, "Queries failed:     {}", self.queries_failed)?;
        writeln!(f, "Raw entries:        {}", self.raw_entries)?;
        writeln!(f, "Duplicates skipped: {}", self.duplicates_skipped)?;
        writeln!(f, "Records kept:       {}", self.records_kept)?;
        Ok(())
    }
}

/// Output of one scan: the record batch in query-then-discovery order,
/// plus run counters. An empty batch means total failure; a non-empty one
/// means at-least-partial success.
#[derive(Debug, Default)]
pub struct ScanBatch {
    pub records: Vec<ShopRecord>,
    pub stats: ScanStats,
}

impl ScanBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct Scanner {
    provider: Box<dyn PlaceProvider>,
}

impl Scanner {
    pub fn new(provider: Box<dyn PlaceProvider>) -> Self {
        Self { provider }
    }

    /// Run every query sequentially. One failing query is logged and yields
    /// zero records; the loop always continues — this is the batch's only
    /// failure-isolation boundary. No retries happen at this layer.
    pub async fn run(&self, queries: &[String]) -> ScanBatch {
        let source = self.provider.source();
        let pause = self.provider.pause();

        let mut batch = ScanBatch::default();
        let mut seen_names = HashSet::new();

        for (i, query) in queries.iter().enumerate() {
            info!(query, source = %source, "Scanning");

            match self.provider.places(query).await {
                Ok(entries) => {
                    let raw_count = entries.len() as u32;
                    batch.stats.queries_run += 1;
                    batch.stats.raw_entries += raw_count;

                    let records = extract_records(query, entries, &mut seen_names, source);
                    batch.stats.duplicates_skipped += raw_count - records.len() as u32;
                    batch.stats.records_kept += records.len() as u32;
                    batch.records.extend(records);
                }
                Err(e) => {
                    warn!(query, error = %e, "Query failed, continuing");
                    batch.stats.queries_failed += 1;
                }
            }

            if i + 1 < queries.len() && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use marketpulse_common::{RawPlace, RecordSource};

    use crate::testing::MockProvider;

    fn place(title: &str) -> RawPlace {
        RawPlace {
            title: Some(title.to_string()),
            ..RawPlace::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn records_accumulate_in_query_order() {
        let provider = MockProvider::new()
            .on_query("gyms in Kochi", vec![place("Iron Temple")])
            .on_query("restaurants in Kochi", vec![place("Kava Kafe")]);

        let batch = Scanner::new(Box::new(provider))
            .run(&[
                "gyms in Kochi".to_string(),
                "restaurants in Kochi".to_string(),
            ])
            .await;

        let names: Vec<&str> = batch.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Iron Temple", "Kava Kafe"]);
        assert_eq!(batch.stats.queries_run, 2);
        assert_eq!(batch.stats.queries_failed, 0);
        assert!(batch
            .records
            .iter()
            .all(|r| r.source == RecordSource::SerpApi));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_names_within_one_query_collapse() {
        let provider =
            MockProvider::new().on_query("gyms in Kochi", vec![place("A"), place("A")]);

        let batch = Scanner::new(Box::new(provider))
            .run(&["gyms in Kochi".to_string()])
            .await;

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].name, "A");
        assert_eq!(batch.stats.raw_entries, 2);
        assert_eq!(batch.stats.duplicates_skipped, 1);
        assert_eq!(batch.stats.records_kept, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dedup_spans_queries() {
        let provider = MockProvider::new()
            .on_query("gyms in Kochi", vec![place("A")])
            .on_query("supermarkets in Kochi", vec![place("A"), place("B")]);

        let batch = Scanner::new(Box::new(provider))
            .run(&[
                "gyms in Kochi".to_string(),
                "supermarkets in Kochi".to_string(),
            ])
            .await;

        let names: Vec<&str> = batch.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(batch.stats.duplicates_skipped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_query_never_aborts_the_batch() {
        let provider = MockProvider::new()
            .fail_on("gyms in Kochi")
            .on_query("restaurants in Kochi", vec![place("Kava Kafe")]);

        let batch = Scanner::new(Box::new(provider))
            .run(&[
                "gyms in Kochi".to_string(),
                "restaurants in Kochi".to_string(),
            ])
            .await;

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.stats.queries_run, 1);
        assert_eq!(batch.stats.queries_failed, 1);
        assert!(!batch.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn all_queries_failing_yields_an_empty_batch() {
        let provider = MockProvider::new().fail_on("gyms in Kochi");

        let batch = Scanner::new(Box::new(provider))
            .run(&["gyms in Kochi".to_string()])
            .await;

        assert!(batch.is_empty());
        assert_eq!(batch.stats.queries_failed, 1);
    }
}

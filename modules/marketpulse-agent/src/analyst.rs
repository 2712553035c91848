//! Market analysis: data-context summarization, the Gemini prompt, and the
//! rate-limit retry policy around the model call.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use gemini_client::{GeminiClient, GeminiError};
use marketpulse_common::ShopRecord;

use crate::report::{self, ArtifactPaths};

/// Total attempts before a rate-limited analysis gives up.
const MAX_ATTEMPTS: u32 = 3;

/// Wait between rate-limited attempts (free-tier quota window).
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(30);

/// How many top-rated shops the data context lists.
const TOP_RATED_COUNT: usize = 5;

/// Returned after retries are exhausted. A deterministic message, not an error.
pub const RETRIES_EXHAUSTED: &str = "AI analysis failed: rate limit persisted after 3 attempts";

// --- Backend seam ---

/// One text-completion call. Implemented by [`GeminiClient`] in production
/// and by the scripted mock in tests.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GeminiError>;
}

#[async_trait]
impl AnalysisBackend for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, GeminiError> {
        self.generate(prompt).await
    }
}

// --- Outcome ---

/// Exactly zero or one successful analysis per call; failures carry a
/// human-readable message instead of propagating.
#[derive(Debug)]
pub enum AnalysisResult {
    Complete {
        analysis: String,
        artifacts: ArtifactPaths,
    },
    Failed {
        message: String,
    },
}

// --- Data context ---

/// Summarize the batch into the bounded context the prompt interpolates:
/// total count, category frequency breakdown, and the top rated shops.
/// Unrated records are excluded from the ranking but counted in the total.
pub fn build_data_context(records: &[ShopRecord]) -> String {
    let mut by_category: HashMap<&str, u32> = HashMap::new();
    for record in records {
        *by_category.entry(record.category.as_str()).or_default() += 1;
    }
    let mut categories: Vec<(&str, u32)> = by_category.into_iter().collect();
    categories.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let category_lines = if categories.is_empty() {
        "none".to_string()
    } else {
        categories
            .iter()
            .map(|(name, count)| format!("{name}: {count}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut rated: Vec<&ShopRecord> = records.iter().filter(|r| r.rating.is_some()).collect();
    // Stable sort: batch order breaks rating ties.
    rated.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top_lines = if rated.is_empty() {
        "none".to_string()
    } else {
        rated
            .iter()
            .take(TOP_RATED_COUNT)
            .map(|r| format!("{}: {:.1}", r.name, r.rating.unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Total shops scraped: {}\n\nCategory breakdown:\n{}\n\nTop rated shops:\n{}\n",
        records.len(),
        category_lines,
        top_lines,
    )
}

fn build_prompt(data_context: &str, total: usize) -> String {
    format!(
        "Act as a Market Intelligence Analyst.\n\
         Here is a summary snapshot of retail data scraped from the city \
         (note: this is a sample, not a complete census):\n\n\
         {data_context}\n\
         Please provide a market snapshot analysis.\n\
         Important: explicitly mention that this analysis is based on available \
         online data samples.\n\n\
         Include:\n\
         1. Executive Summary (highlighting that this is based on {total} sample data points)\n\
         2. Observed Category Trends (which businesses appear most frequent in this sample?)\n\
         3. Potential Gaps (what businesses seem underrepresented in the online results?)\n\
         4. Strategic Recommendations for a new investor (based on this digital footprint).\n\n\
         Format the output clearly with headers.",
    )
}

// --- Analysis with retry ---

/// Submit the batch summary to the model and write both report artifacts on
/// success. Rate-limit errors are retried after a fixed cooldown, up to
/// [`MAX_ATTEMPTS`] total tries; any other backend error fails immediately.
/// No artifact is written before the backend finally succeeds.
pub async fn analyze_market_data<B>(
    backend: &B,
    records: &[ShopRecord],
    out_dir: &Path,
) -> AnalysisResult
where
    B: AnalysisBackend + ?Sized,
{
    let data_context = build_data_context(records);
    let prompt = build_prompt(&data_context, records.len());

    for attempt in 1..=MAX_ATTEMPTS {
        match backend.complete(&prompt).await {
            Ok(analysis) => {
                info!(attempt, chars = analysis.len(), "Analysis received");
                return match report::write_artifacts(out_dir, &analysis, &data_context) {
                    Ok(artifacts) => AnalysisResult::Complete {
                        analysis,
                        artifacts,
                    },
                    Err(e) => AnalysisResult::Failed {
                        message: format!("Failed to write report artifacts: {e}"),
                    },
                };
            }
            Err(GeminiError::RateLimited(_)) => {
                warn!(
                    attempt,
                    max = MAX_ATTEMPTS,
                    "Rate limited by the model backend"
                );
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(RATE_LIMIT_COOLDOWN).await;
                }
            }
            Err(e) => {
                return AnalysisResult::Failed {
                    message: format!("AI analysis failed: {e}"),
                };
            }
        }
    }

    AnalysisResult::Failed {
        message: RETRIES_EXHAUSTED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use marketpulse_common::{RecordSource, UNKNOWN};

    use crate::testing::ScriptedBackend;

    fn record(name: &str, category: &str, rating: Option<f64>) -> ShopRecord {
        ShopRecord {
            name: name.to_string(),
            category: category.to_string(),
            rating,
            review_count: 0,
            address: UNKNOWN.to_string(),
            phone: UNKNOWN.to_string(),
            website: UNKNOWN.to_string(),
            open_status: UNKNOWN.to_string(),
            source: RecordSource::SerpApi,
        }
    }

    #[test]
    fn context_counts_categories_most_frequent_first() {
        let records = vec![
            record("A", "Gyms", None),
            record("B", "Restaurants", None),
            record("C", "Restaurants", None),
        ];

        let context = build_data_context(&records);
        assert!(context.starts_with("Total shops scraped: 3"));
        let restaurants = context.find("Restaurants: 2").unwrap();
        let gyms = context.find("Gyms: 1").unwrap();
        assert!(restaurants < gyms);
    }

    #[test]
    fn top_rated_excludes_unrated_and_keeps_batch_order_on_ties() {
        let records = vec![
            record("Unrated", "Gyms", None),
            record("First", "Gyms", Some(4.5)),
            record("Second", "Gyms", Some(4.5)),
            record("Best", "Gyms", Some(4.9)),
        ];

        let context = build_data_context(&records);
        assert!(!context.contains("Unrated:"));
        let best = context.find("Best: 4.9").unwrap();
        let first = context.find("First: 4.5").unwrap();
        let second = context.find("Second: 4.5").unwrap();
        assert!(best < first && first < second);
    }

    #[test]
    fn top_rated_is_capped_at_five() {
        let records: Vec<ShopRecord> = (0..8)
            .map(|i| record(&format!("Shop {i}"), "Gyms", Some(4.0)))
            .collect();

        let context = build_data_context(&records);
        let listed = context.matches("Shop ").count();
        assert_eq!(listed, TOP_RATED_COUNT);
    }

    #[test]
    fn empty_batch_yields_a_zero_context() {
        let context = build_data_context(&[]);
        assert!(context.starts_with("Total shops scraped: 0"));
        assert!(context.contains("Category breakdown:\nnone"));
        assert!(context.contains("Top rated shops:\nnone"));
    }

    #[test]
    fn prompt_embeds_the_context_and_sample_size() {
        let records = vec![record("A", "Gyms", Some(4.0))];
        let context = build_data_context(&records);
        let prompt = build_prompt(&context, records.len());
        assert!(prompt.contains(&context));
        assert!(prompt.contains("based on 1 sample data points"));
        assert!(prompt.contains("Executive Summary"));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limits_are_retried_until_success() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new()
            .then_rate_limited()
            .then_rate_limited()
            .then_ok("All clear");

        let result = analyze_market_data(&backend, &[], dir.path()).await;

        assert_eq!(backend.attempts(), 3);
        match result {
            AnalysisResult::Complete { analysis, .. } => assert_eq!(analysis, "All clear"),
            AnalysisResult::Failed { message } => panic!("unexpected failure: {message}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limits_exhaust_after_three_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new()
            .then_rate_limited()
            .then_rate_limited()
            .then_rate_limited();

        let result = analyze_market_data(&backend, &[], dir.path()).await;

        assert_eq!(backend.attempts(), 3);
        match result {
            AnalysisResult::Failed { message } => assert_eq!(message, RETRIES_EXHAUSTED),
            AnalysisResult::Complete { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_errors_fail_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new().then_error("invalid API key");

        let result = analyze_market_data(&backend, &[], dir.path()).await;

        assert_eq!(backend.attempts(), 1);
        match result {
            AnalysisResult::Failed { message } => {
                assert!(message.starts_with("AI analysis failed:"));
                assert!(message.contains("invalid API key"));
            }
            AnalysisResult::Complete { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_artifacts_are_written_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new().then_error("boom");

        let _ = analyze_market_data(&backend, &[], dir.path()).await;

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 0);
    }
}

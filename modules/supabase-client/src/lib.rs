pub mod error;

pub use error::{Result, SupabaseError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Minimal client for the Supabase PostgREST surface: batch writes and
/// whole-table reads against a single project.
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Insert rows, merging into any existing row that shares the
    /// `on_conflict` column value. Last write wins.
    pub async fn upsert<T: Serialize>(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &[T],
    ) -> Result<()> {
        debug!(table, rows = rows.len(), "Upserting rows");

        let url = format!("{}?on_conflict={}", self.table_url(table), on_conflict);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&rows)
            .send()
            .await?;

        check(resp).await?;
        Ok(())
    }

    /// Plain insert. Fails on key collision instead of merging.
    pub async fn insert<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<()> {
        debug!(table, rows = rows.len(), "Inserting rows");

        let resp = self
            .client
            .post(&self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;

        check(resp).await?;
        Ok(())
    }

    /// Fetch every row of a table.
    pub async fn select_all<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let url = format!("{}?select=*", self.table_url(table));
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let resp = check(resp).await?;
        Ok(resp.json().await?)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(SupabaseError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp)
}

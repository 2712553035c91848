//! Best-effort cloud mirror of a record batch. Missing credentials put the
//! store in offline mode, which skips rather than fails.

use anyhow::{Context, Result};
use tracing::{info, warn};

use marketpulse_common::{Config, ShopRecord};
use supabase_client::SupabaseClient;

/// Target table in the Supabase project. `name` is its natural key.
const SHOPS_TABLE: &str = "shops";

/// Result of one save. Never an `Err`: remote failures are reported here
/// and must not take the rest of the pipeline down.
#[derive(Debug, PartialEq, Eq)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
}

impl SaveOutcome {
    fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
        }
    }
}

pub struct ShopStore {
    client: Option<SupabaseClient>,
}

impl ShopStore {
    /// Build a store from whatever credentials are present. Either one
    /// missing means offline mode: no connection handle, saves become
    /// no-op skips.
    pub fn from_config(config: &Config) -> Self {
        match (&config.supabase_url, &config.supabase_key) {
            (Some(url), Some(key)) => {
                info!("Cloud store connected");
                Self {
                    client: Some(SupabaseClient::new(url, key)),
                }
            }
            _ => {
                warn!("Supabase credentials not set, running in offline mode");
                Self { client: None }
            }
        }
    }

    pub fn is_offline(&self) -> bool {
        self.client.is_none()
    }

    /// Mirror the batch to the cloud table. Upsert resolves conflicts on
    /// the record name, last write wins; plain insert fails on collision.
    pub async fn save(&self, records: &[ShopRecord], upsert: bool) -> SaveOutcome {
        if records.is_empty() {
            return SaveOutcome::new(false, "no data");
        }

        let Some(client) = &self.client else {
            return SaveOutcome::new(true, "offline mode, cloud sync skipped");
        };

        info!(count = records.len(), upsert, "Uploading records to cloud");
        let result = if upsert {
            client.upsert(SHOPS_TABLE, "name", records).await
        } else {
            client.insert(SHOPS_TABLE, records).await
        };

        match result {
            Ok(()) => SaveOutcome::new(true, format!("uploaded {} records", records.len())),
            Err(e) => {
                warn!(error = %e, "Cloud upload failed");
                SaveOutcome::new(false, e.to_string())
            }
        }
    }

    /// Fetch the whole cloud table, for export. Offline mode is an error
    /// here: there is nothing to export from.
    pub async fn export_all(&self) -> Result<Vec<ShopRecord>> {
        let client = self
            .client
            .as_ref()
            .context("Cannot export from cloud: no connection configured")?;
        let records = client
            .select_all(SHOPS_TABLE)
            .await
            .context("Cloud fetch failed")?;
        info!(count = records.len(), "Fetched cloud records");
        Ok(records)
    }
}

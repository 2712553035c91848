use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use tracing::info;

use marketpulse_common::{Config, MarketError, RawPlace, RecordSource};
use serpapi_client::{MapsPlace, SerpApiClient};

use crate::browser::{ChromeProvider, ChromeSession};

/// Courtesy delay between consecutive search API calls.
const SERPAPI_PAUSE: Duration = Duration::from_secs(1);

// --- PlaceProvider trait ---

/// A scraping strategy: turns one query into raw place listings.
#[async_trait]
pub trait PlaceProvider: Send + Sync {
    async fn places(&self, query: &str) -> Result<Vec<RawPlace>>;

    /// Source tag that extracted records carry.
    fn source(&self) -> RecordSource;

    /// Politeness delay between consecutive queries.
    fn pause(&self) -> Duration {
        Duration::ZERO
    }
}

impl std::fmt::Debug for dyn PlaceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceProvider").finish_non_exhaustive()
    }
}

// --- SerpApi strategy ---

pub struct SerpApiProvider {
    client: SerpApiClient,
}

impl SerpApiProvider {
    pub fn new(api_key: &str) -> Self {
        info!("Using SerpApi place provider");
        Self {
            client: SerpApiClient::new(api_key.to_string()),
        }
    }
}

#[async_trait]
impl PlaceProvider for SerpApiProvider {
    async fn places(&self, query: &str) -> Result<Vec<RawPlace>> {
        let places = self
            .client
            .maps_search(query)
            .await
            .context("Maps search request failed")?;
        Ok(places.into_iter().map(raw_from_maps).collect())
    }

    fn source(&self) -> RecordSource {
        RecordSource::SerpApi
    }

    fn pause(&self) -> Duration {
        SERPAPI_PAUSE
    }
}

fn raw_from_maps(place: MapsPlace) -> RawPlace {
    RawPlace {
        title: place.title,
        rating: place.rating,
        reviews: place.reviews,
        address: place.address,
        phone: place.phone,
        website: place.website,
        open_state: place.open_state,
        category: None,
    }
}

// --- Provider selection ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    #[value(name = "serpapi")]
    SerpApi,
    Chrome,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::SerpApi => write!(f, "serpapi"),
            ProviderKind::Chrome => write!(f, "chrome"),
        }
    }
}

pub fn build_provider(kind: ProviderKind, config: &Config) -> Result<Box<dyn PlaceProvider>> {
    match kind {
        ProviderKind::SerpApi => {
            let Some(key) = &config.serpapi_key else {
                return Err(MarketError::Config(
                    "SERPAPI_KEY is required for the serpapi provider".to_string(),
                )
                .into());
            };
            Ok(Box::new(SerpApiProvider::new(key)))
        }
        ProviderKind::Chrome => {
            let session = ChromeSession::launch(&config.chrome_bin)?;
            Ok(Box::new(ChromeProvider::new(session)))
        }
    }
}

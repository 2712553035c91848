pub mod error;
pub mod types;

pub use error::{Result, SerpApiError};
pub use types::{MapsPlace, SearchEnvelope};

use std::time::Duration;

const BASE_URL: &str = "https://serpapi.com";

/// Per-request timeout. Maps searches answer well inside this or not at all.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the API endpoint, mainly for tests.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Run one Google Maps search and return its local place listings.
    pub async fn maps_search(&self, query: &str) -> Result<Vec<MapsPlace>> {
        let url = format!("{}/search.json", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("api_key", &self.api_key),
                ("engine", "google_maps"),
                ("type", "search"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SerpApiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: SearchEnvelope = resp.json().await?;
        let places = places_from_envelope(envelope);
        tracing::info!(query, count = places.len(), "Fetched maps listings");
        Ok(places)
    }
}

/// Decode each `local_results` entry on its own so one malformed entry is
/// dropped instead of failing the whole page.
fn places_from_envelope(envelope: SearchEnvelope) -> Vec<MapsPlace> {
    envelope
        .local_results
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<MapsPlace>(value) {
            Ok(place) => Some(place),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping malformed place entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash_from_base_url() {
        let client = SerpApiClient::new("key".to_string()).with_base_url("http://localhost:9000/");
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() {
        let envelope: SearchEnvelope = serde_json::from_str(
            r#"{"local_results":[
                {"title":"Spice Bazaar","rating":4.2},
                {"title":"Bad Entry","rating":"not-a-number"},
                {"title":"Corner Store"}
            ]}"#,
        )
        .unwrap();

        let places = places_from_envelope(envelope);
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].title.as_deref(), Some("Spice Bazaar"));
        assert_eq!(places[1].title.as_deref(), Some("Corner Store"));
    }

    #[test]
    fn empty_envelope_yields_no_places() {
        let envelope: SearchEnvelope = serde_json::from_str("{}").unwrap();
        assert!(places_from_envelope(envelope).is_empty());
    }
}

use serde::Deserialize;

/// Top-level response for a Google Maps engine search.
///
/// Queries that match nothing come back without a `local_results` key at
/// all, which is an empty result set rather than an error.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEnvelope {
    #[serde(default)]
    pub local_results: Vec<serde_json::Value>,
}

/// One place entry from `local_results`. Every field the API may omit is
/// optional; entries are decoded individually so one malformed entry never
/// poisons the rest of the page.
#[derive(Debug, Clone, Deserialize)]
pub struct MapsPlace {
    pub title: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub open_state: Option<String>,
}

use serde::{Deserialize, Serialize};

/// Placeholder for fields a provider did not supply.
pub const UNKNOWN: &str = "unknown";

// --- Record Types ---

/// Which scraping strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    SerpApi,
    Chrome,
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSource::SerpApi => write!(f, "serpapi"),
            RecordSource::Chrome => write!(f, "chrome"),
        }
    }
}

/// One listing as a provider returned it, before normalization.
///
/// Every field is optional; the extractor decides defaults. `category` is
/// only set by providers that surface one themselves (the browser strategy
/// does, the search API does not).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlace {
    pub title: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub open_state: Option<String>,
    pub category: Option<String>,
}

/// One discovered business, normalized and deduplicated.
///
/// `name` is the dedup key within a scan batch. A `None` rating is the
/// "unknown" sentinel and serializes as that literal string so tabular and
/// document output never show an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopRecord {
    pub name: String,
    pub category: String,
    #[serde(with = "rating_serde")]
    pub rating: Option<f64>,
    pub review_count: u32,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub open_status: String,
    pub source: RecordSource,
}

/// Round-trips `Option<f64>` through number-or-sentinel form: a missing
/// rating serializes as the string `unknown`, and deserialization accepts
/// numbers, numeric strings, the sentinel, and empty cells.
pub mod rating_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(rating) => serializer.serialize_f64(*rating),
            None => serializer.serialize_str(super::UNKNOWN),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(rating)) => Some(rating),
            Some(Raw::Text(text)) => text.trim().parse::<f64>().ok(),
            None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rating: Option<f64>) -> ShopRecord {
        ShopRecord {
            name: "Kava Kafe".to_string(),
            category: "Restaurants".to_string(),
            rating,
            review_count: 12,
            address: UNKNOWN.to_string(),
            phone: UNKNOWN.to_string(),
            website: UNKNOWN.to_string(),
            open_status: "Open".to_string(),
            source: RecordSource::SerpApi,
        }
    }

    #[test]
    fn missing_rating_serializes_as_sentinel() {
        let json = serde_json::to_value(record(None)).unwrap();
        assert_eq!(json["rating"], serde_json::json!("unknown"));
    }

    #[test]
    fn present_rating_serializes_as_number() {
        let json = serde_json::to_value(record(Some(4.3))).unwrap();
        assert_eq!(json["rating"], serde_json::json!(4.3));
    }

    #[test]
    fn rating_deserializes_from_number_string_and_sentinel() {
        for (raw, expected) in [
            ("4.5", Some(4.5)),
            ("\"4.5\"", Some(4.5)),
            ("\"unknown\"", None),
            ("\"N/A\"", None),
            ("null", None),
        ] {
            let json = format!(
                r#"{{"name":"A","category":"Gyms","rating":{raw},"review_count":0,
                    "address":"unknown","phone":"unknown","website":"unknown",
                    "open_status":"unknown","source":"chrome"}}"#
            );
            let parsed: ShopRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed.rating, expected, "raw rating {raw}");
        }
    }

    #[test]
    fn source_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_string(&RecordSource::SerpApi).unwrap(),
            "\"serpapi\""
        );
        assert_eq!(
            serde_json::to_string(&RecordSource::Chrome).unwrap(),
            "\"chrome\""
        );
    }
}

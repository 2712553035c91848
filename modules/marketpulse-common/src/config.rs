use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
///
/// Every credential is optional: the feature that needs one checks at the
/// point of use, so a partial setup still runs the paths it can.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub serpapi_key: Option<String>,
    pub gemini_key: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub chrome_bin: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            serpapi_key: optional_env("SERPAPI_KEY"),
            gemini_key: optional_env("GEMINI_KEY"),
            supabase_url: optional_env("SUPABASE_URL"),
            supabase_key: optional_env("SUPABASE_KEY"),
            chrome_bin: env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string()),
        }
    }

    /// Log which credentials are present without echoing their values.
    pub fn log_redacted(&self) {
        info!(
            serpapi = self.serpapi_key.is_some(),
            gemini = self.gemini_key.is_some(),
            supabase = self.supabase_url.is_some() && self.supabase_key.is_some(),
            chrome_bin = %self.chrome_bin,
            "Configuration loaded"
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

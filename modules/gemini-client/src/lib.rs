pub mod error;
pub mod types;

pub use error::{GeminiError, Result};
pub use types::{GenerateRequest, GenerateResponse};

use reqwest::StatusCode;
use tracing::debug;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: GEMINI_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the API endpoint, mainly for tests.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one prompt and return the model's text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest::from_prompt(prompt);

        debug!(model = %self.model, "Gemini generate request");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeminiError::RateLimited(body));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        parsed.text().ok_or(GeminiError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_starts_on_the_default_model() {
        let client = GeminiClient::new("key");
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url, GEMINI_API_URL);
    }

    #[test]
    fn model_and_base_url_can_be_overridden() {
        let client = GeminiClient::new("key")
            .with_model("gemini-flash-latest")
            .with_base_url("http://localhost:9100/");
        assert_eq!(client.model(), "gemini-flash-latest");
        assert_eq!(client.base_url, "http://localhost:9100");
    }
}

// Test mocks for the two trait boundaries:
// - MockProvider (PlaceProvider) — HashMap-based query→listings
// - ScriptedBackend (AnalysisBackend) — scripted outcome per attempt

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use gemini_client::GeminiError;
use marketpulse_common::{RawPlace, RecordSource};

use crate::analyst::AnalysisBackend;
use crate::providers::PlaceProvider;

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// HashMap-based place provider. Returns `Err` for unregistered queries so a
/// typo in a test surfaces instead of passing as an empty result. Builder
/// pattern: `.on_query()`, `.fail_on()`, `.with_source()`.
pub struct MockProvider {
    responses: HashMap<String, Vec<RawPlace>>,
    failures: Vec<String>,
    source: RecordSource,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            failures: Vec::new(),
            source: RecordSource::SerpApi,
        }
    }

    pub fn on_query(mut self, query: &str, places: Vec<RawPlace>) -> Self {
        self.responses.insert(query.to_string(), places);
        self
    }

    /// Make one query fail with a provider error.
    pub fn fail_on(mut self, query: &str) -> Self {
        self.failures.push(query.to_string());
        self
    }

    pub fn with_source(mut self, source: RecordSource) -> Self {
        self.source = source;
        self
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaceProvider for MockProvider {
    async fn places(&self, query: &str) -> Result<Vec<RawPlace>> {
        if self.failures.iter().any(|q| q == query) {
            bail!("mock provider failure for query: {query}");
        }
        match self.responses.get(query) {
            Some(places) => Ok(places.clone()),
            None => bail!("no mock response registered for query: {query}"),
        }
    }

    fn source(&self) -> RecordSource {
        self.source
    }

    fn pause(&self) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// ScriptedBackend
// ---------------------------------------------------------------------------

enum ScriptedCall {
    Ok(String),
    RateLimited,
    Error(String),
}

/// Analysis backend that plays a fixed script, one entry per attempt, and
/// counts how often it was called. Builder pattern: `.then_ok()`,
/// `.then_rate_limited()`, `.then_error()`.
pub struct ScriptedBackend {
    script: Mutex<Vec<ScriptedCall>>,
    attempts: AtomicU32,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn then_ok(self, text: &str) -> Self {
        self.push(ScriptedCall::Ok(text.to_string()))
    }

    pub fn then_rate_limited(self) -> Self {
        self.push(ScriptedCall::RateLimited)
    }

    pub fn then_error(self, message: &str) -> Self {
        self.push(ScriptedCall::Error(message.to_string()))
    }

    /// How many completion calls the backend has served.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn push(self, call: ScriptedCall) -> Self {
        self.script.lock().unwrap().push(call);
        self
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn complete(&self, _prompt: &str) -> std::result::Result<String, GeminiError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            panic!("ScriptedBackend script exhausted");
        }
        match script.remove(0) {
            ScriptedCall::Ok(text) => Ok(text),
            ScriptedCall::RateLimited => {
                Err(GeminiError::RateLimited("quota exceeded".to_string()))
            }
            ScriptedCall::Error(message) => Err(GeminiError::Api {
                status: 400,
                message,
            }),
        }
    }
}

//! Gemini embedding client.
//!
//! Calls `POST {base_url}/models/{model}:embedContent` and returns the
//! embedding values. Transport errors, timeouts, 429 and 5xx responses are
//! retried with exponential backoff; anything else fails immediately.

use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoffBuilder};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use roster_types::EmbeddingSettings;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Public Gemini API endpoint
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini embedder.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL
    pub base_url: String,

    /// Model to use, without the `models/` prefix
    pub model: String,

    /// API key
    pub api_key: SecretString,

    /// Expected embedding dimension
    pub dimension: usize,

    /// Request timeout
    pub timeout: Duration,

    /// Maximum attempts per text
    pub max_retries: u32,

    /// First backoff interval between attempts
    pub initial_backoff: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        let model = model.into();
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: model.trim_start_matches("models/").to_string(),
            api_key: SecretString::from(api_key.into()),
            dimension,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }

    /// Build from loaded settings. Fails when no API key is available.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, EmbeddingError> {
        if settings.provider != "gemini" {
            return Err(EmbeddingError::Config(format!(
                "unsupported embedding provider '{}'",
                settings.provider
            )));
        }

        let api_key = settings.resolved_api_key().ok_or_else(|| {
            EmbeddingError::Config(
                "no API key: set embedding.api_key or GEMINI_API_KEY".to_string(),
            )
        })?;

        let mut config = Self::new(api_key, settings.model.clone(), settings.dimension);
        if let Some(base_url) = &settings.api_base_url {
            config.base_url = base_url.clone();
        }
        config.timeout = Duration::from_secs(settings.timeout_secs);
        config.max_retries = settings.max_retries;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbedValues,
}

#[derive(Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

/// Gemini-backed embedder.
///
/// Uses a blocking HTTP client; call it from a plain thread or from
/// `tokio::task::spawn_blocking`, never directly on an async worker.
pub struct GeminiEmbedder {
    client: Client,
    config: GeminiConfig,
    info: ModelInfo,
}

impl GeminiEmbedder {
    pub fn new(config: GeminiConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;

        let info = ModelInfo {
            name: config.model.clone(),
            dimension: config.dimension,
        };

        Ok(Self {
            client,
            config,
            info,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:embedContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Call the API with retry logic.
    fn call_api(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.config.initial_backoff)
            .with_max_elapsed_time(Some(Duration::from_secs(120)))
            .build();

        let max_attempts = self.config.max_retries.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, model = %self.config.model, "Calling embedding API");

            match self.make_request(text) {
                Ok(values) => return Ok(values),
                Err(e) => {
                    if !e.is_transient() {
                        error!(error = %e, "Embedding request rejected");
                        return Err(e);
                    }
                    if attempts >= max_attempts {
                        error!(error = %e, attempts, "Max retries exceeded");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis() as u64,
                                "Embedding call failed, retrying"
                            );
                            std::thread::sleep(duration);
                        }
                        None => {
                            error!(error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// Make a single API request.
    fn make_request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbedRequest {
            model: format!("models/{}", self.config.model),
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout(self.config.timeout.as_secs())
                } else {
                    EmbeddingError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(EmbeddingError::RateLimitExceeded);
        }

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbeddingError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: EmbedResponse = response
            .json()
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(body.embedding.values)
    }
}

impl EmbeddingModel for GeminiEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }

        let embedding = Embedding::new(self.call_api(text)?);
        embedding.check_dimension(self.info.dimension)?;
        Ok(embedding)
    }
}

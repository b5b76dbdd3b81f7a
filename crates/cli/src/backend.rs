//! Ollama inference backend.
//!
//! Sends one non-streaming `/api/generate` request per cache miss so that a
//! single round trip is measured for every missed prompt.

use std::time::{Duration, Instant};

use cachebench_core::common::BackendError;
use cachebench_core::latency::{BackendResponse, InferenceBackend};
use reqwest::blocking::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Request body of `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// The part of the `/api/generate` response this backend reads.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Blocking HTTP client for a local or remote Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    /// Creates a backend for `model` served at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error if the HTTP client cannot be built.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_owned(),
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn classify(err: &reqwest::Error) -> BackendError {
    if err.is_connect() {
        BackendError::Unavailable(err.to_string())
    } else {
        BackendError::Request(err.to_string())
    }
}

impl InferenceBackend for OllamaBackend {
    fn invoke(&self, key: &str) -> Result<BackendResponse, BackendError> {
        let started = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest {
                model: &self.model,
                prompt: key,
                stream: false,
            })
            .send()
            .map_err(|e| classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        let body: GenerateResponse = response
            .json()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let elapsed = started.elapsed();
        debug!(model = %self.model, elapsed_ms = elapsed.as_millis(), "ollama generate");

        Ok(BackendResponse {
            body: body.response,
            elapsed,
        })
    }
}

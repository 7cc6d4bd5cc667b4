//! Client side of the external text-generation capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http_client;

const ERROR_BODY_LIMIT: usize = 512;

/// Anything that turns a prompt plus a system instruction into text.
#[async_trait]
pub(crate) trait Generator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str, system: &str)
        -> Result<String, GenerateError>;
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum GenerateError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Generator backed by an Ollama server's `/api/generate` endpoint.
pub(crate) struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateReply {
    response: Option<String>,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = http_client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim().trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
    ) -> Result<String, GenerateError> {
        let url = self.endpoint.clone();
        let body = GenerateBody {
            model,
            prompt,
            system,
            stream: false,
        };
        debug!(target: "opg::generate", %url, model, "sending generation request");
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| GenerateError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|source| GenerateError::Transport {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorReply>(&bytes)
                .map(|e| e.error)
                .unwrap_or_else(|_| {
                    String::from_utf8_lossy(&bytes)
                        .chars()
                        .take(ERROR_BODY_LIMIT)
                        .collect()
                });
            return Err(GenerateError::Status {
                url,
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateReply =
            serde_json::from_slice(&bytes).map_err(|e| GenerateError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        reply.response.ok_or_else(|| GenerateError::Decode {
            url,
            reason: "missing `response` field".into(),
        })
    }
}

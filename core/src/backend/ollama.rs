//! Ollama Backend Implementation
//!
//! Client for the Ollama daemon's REST API:
//! - `/api/chat` - chat completions, optionally with image attachments
//! - `/api/tags` - list available models
//!
//! Requests are non-streaming: one POST, one reply, one outcome. The
//! availability probe is a raw TCP connect so it works even when the
//! HTTP layer is misbehaving.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use super::{ChatBackend, ChatOutcome, ModelInfo};
use crate::config::BackendSettings;
use crate::error::ChatError;
use crate::request::ChatRequest;

/// Ollama chat client
#[derive(Clone)]
pub struct OllamaChat {
    host: String,
    port: u16,
    connect_timeout: Duration,
    http_client: reqwest::Client,
}

impl OllamaChat {
    /// Create a client from backend settings
    pub fn new(settings: &BackendSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            connect_timeout: Duration::from_millis(settings.connect_timeout_ms),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.request_timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create a client from `OLLAMA_HOST` / `OLLAMA_PORT`, falling back
    /// to `localhost:11434`
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = BackendSettings::default();
        settings.apply_env();
        Self::new(&settings)
    }

    /// The host:port this client talks to
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url())
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }

    /// Build the Ollama message list: [system?] + user, images on the
    /// user message
    fn build_messages(&self, request: &ChatRequest) -> Result<serde_json::Value, ChatError> {
        let mut messages = Vec::new();

        if let Some(ref system) = request.system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system,
            }));
        }

        let mut user = serde_json::json!({
            "role": "user",
            "content": request.message,
        });

        if request.has_images() {
            let mut encoded = Vec::with_capacity(request.images.len());
            for image in &request.images {
                let data = image.encode().map_err(|source| ChatError::Attachment {
                    path: std::path::PathBuf::from(image.describe()),
                    source,
                })?;
                encoded.push(data);
            }
            user["images"] = serde_json::json!(encoded);
        }

        messages.push(user);
        Ok(serde_json::Value::Array(messages))
    }

    fn classify(&self, err: reqwest::Error) -> ChatError {
        if err.is_connect() || err.is_timeout() {
            ChatError::TransportUnavailable {
                endpoint: self.endpoint(),
                reason: err.to_string(),
            }
        } else {
            ChatError::Service {
                reason: err.to_string(),
            }
        }
    }

    async fn try_send(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let payload = serde_json::json!({
            "model": request.model,
            "messages": self.build_messages(request)?,
            "stream": false,
        });

        let response = self
            .http_client
            .post(self.chat_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Service {
                reason: format!("Ollama returned {status}: {body}"),
            });
        }

        let data: serde_json::Value = response.json().await.map_err(|e| self.classify(e))?;

        data.get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(String::from)
            .ok_or_else(|| ChatError::Service {
                reason: "reply missing message content".to_string(),
            })
    }

    async fn try_list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
        let response = self
            .http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ChatError::Service {
                reason: format!("Ollama returned {status}"),
            });
        }

        let data: serde_json::Value = response.json().await.map_err(|e| self.classify(e))?;

        let models = data
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| {
                        let name = m.get("name")?.as_str()?.to_string();
                        let size = m.get("size").and_then(serde_json::Value::as_u64);
                        let parameter_size = m
                            .get("details")
                            .and_then(|d| d.get("parameter_size"))
                            .and_then(|p| p.as_str())
                            .map(String::from);

                        Some(ModelInfo {
                            name,
                            size,
                            parameter_size,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }
}

impl Default for OllamaChat {
    fn default() -> Self {
        Self::new(&BackendSettings::default())
    }
}

#[async_trait]
impl ChatBackend for OllamaChat {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn probe(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::warn!(endpoint = %self.endpoint(), error = %e, "backend probe failed");
                false
            }
            Err(_) => {
                tracing::warn!(endpoint = %self.endpoint(), "backend probe timed out");
                false
            }
        }
    }

    async fn send(&self, request: &ChatRequest) -> ChatOutcome {
        match self.try_send(request).await {
            Ok(text) => ChatOutcome::Success { text },
            Err(e) => {
                tracing::warn!(model = %request.model, error = %e, "chat request failed");
                ChatOutcome::Failure {
                    message: format!("Could not get response from {}: {e}", request.model),
                }
            }
        }
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        match self.try_list_models().await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!(error = %e, "model listing failed, returning empty catalog");
                Vec::new()
            }
        }
    }
}

use bytes::Bytes;
use futures::Stream;
use reqwest::Client;
use std::pin::Pin;
use tracing::info;

use crate::config::AnthropicConfig;
use crate::error::{RelayError, Result};
use crate::models::anthropic::{MessagesRequest, MessagesResponse};

/// Raw byte stream of a streaming provider response
pub type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Client for the Anthropic Messages API
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| {
                RelayError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn post_messages(&self, body: &MessagesRequest) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("Content-Type", "application/json")
            .header("anthropic-version", "2023-06-01")
            .header("x-api-key", &self.config.api_key)
            .json(body)
    }

    /// Generate a complete message and wait for the full response body
    pub async fn create_message(&self, system: String, prompt: &str) -> Result<MessagesResponse> {
        let body = MessagesRequest::single_turn(
            &self.config.model,
            self.config.max_tokens,
            system,
            prompt,
            false,
        );

        info!(model = %self.config.model, "Anthropic: sending message request");

        let response = self
            .post_messages(&body)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("Anthropic request failed: {}", e)))?;

        let status = response.status();
        info!(%status, "Anthropic responded");

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RelayError::Upstream(format!(
                "Anthropic API error {}: {}",
                status, error_body
            )));
        }

        response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| RelayError::Protocol(format!("Malformed Anthropic response: {}", e)))
    }

    /// Open a streaming generation and hand back the raw SSE byte stream
    pub async fn stream_message(&self, system: String, prompt: &str) -> Result<ByteStream> {
        let body = MessagesRequest::single_turn(
            &self.config.model,
            self.config.max_tokens,
            system,
            prompt,
            true,
        );

        info!(model = %self.config.model, "Anthropic: opening message stream");

        let response = self
            .post_messages(&body)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("Anthropic request failed: {}", e)))?;

        let status = response.status();
        info!(%status, "Anthropic responded");

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RelayError::Upstream(format!(
                "Anthropic API error {}: {}",
                status, error_body
            )));
        }

        Ok(Box::pin(response.bytes_stream()))
    }
}

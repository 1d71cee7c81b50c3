use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tracing::{error, info};

use crate::error::{RelayError, Result};
use crate::models::api::{ListingParams, ListingSection, WritingParams};
use crate::prompt::listing_prompt;
use crate::streaming::{ConsumeStatus, StreamConsumer};

/// Lifecycle of one generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Submitting,
    Streaming,
    Completed,
    Failed,
}

/// Builds the HTTP request for one assistant variant.
///
/// The generic writing assistant and the real-estate listing generator share
/// one orchestrator; only the endpoint and body shape differ, so that seam
/// is a trait.
pub trait RequestBuilder: Send + Sync {
    /// The prompt text whose emptiness gates submission
    fn prompt(&self) -> &str;

    /// Endpoint path on the relay
    fn endpoint_path(&self, streaming: bool) -> &'static str;

    /// Attach the body to a prepared request
    fn apply(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder>;

    /// Variant name for logging
    fn name(&self) -> &'static str;
}

impl RequestBuilder for WritingParams {
    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn endpoint_path(&self, streaming: bool) -> &'static str {
        if streaming {
            "/generate/stream"
        } else {
            "/generate"
        }
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        Ok(request.json(self))
    }

    fn name(&self) -> &'static str {
        "writing"
    }
}

/// One uploaded listing photo
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub const MAX_IMAGE_COUNT: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

pub fn validate_images(images: &[ImageAttachment]) -> Result<()> {
    if images.len() > MAX_IMAGE_COUNT {
        return Err(RelayError::Validation(format!(
            "Too many images: {} (max {})",
            images.len(),
            MAX_IMAGE_COUNT
        )));
    }
    for image in images {
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return Err(RelayError::Validation(format!(
                "Image {} too large: {} bytes (max {})",
                image.file_name,
                image.bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }
        if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
            return Err(RelayError::Validation(format!(
                "Unsupported image type: {}",
                image.content_type
            )));
        }
    }
    Ok(())
}

/// Listing-variant request: structured fields plus photos, sent as multipart
pub struct ListingRequest {
    params: ListingParams,
    images: Vec<ImageAttachment>,
    prompt: String,
}

impl ListingRequest {
    pub fn new(params: ListingParams, images: Vec<ImageAttachment>) -> Result<Self> {
        validate_images(&images)?;
        let prompt = listing_prompt(&params);
        Ok(Self {
            params,
            images,
            prompt,
        })
    }

    fn form(&self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new()
            .text("property_type", self.params.property_type.clone())
            .text("listing_purpose", self.params.listing_purpose.clone())
            .text("bedrooms", self.params.bedrooms.clone())
            .text("bathrooms", self.params.bathrooms.clone())
            .text("sqft", self.params.sqft.clone())
            .text("price", self.params.price.clone())
            .text("address", self.params.address.clone())
            .text("features", serde_json::to_string(&self.params.features)?)
            .text("additional_notes", self.params.additional_notes.clone());

        for image in &self.images {
            let part = reqwest::multipart::Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)
                .map_err(|e| {
                    RelayError::Validation(format!("Invalid image content type: {}", e))
                })?;
            form = form.part("images", part);
        }

        Ok(form)
    }
}

impl RequestBuilder for ListingRequest {
    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn endpoint_path(&self, _streaming: bool) -> &'static str {
        "/generate-listing"
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        Ok(request.multipart(self.form()?))
    }

    fn name(&self) -> &'static str {
        "listing"
    }
}

/// Regenerate one section of an existing listing
pub struct SectionRequest {
    section: ListingSection,
    listing: ListingRequest,
}

impl SectionRequest {
    pub fn new(section: ListingSection, params: ListingParams) -> Result<Self> {
        let listing = ListingRequest::new(params, Vec::new())?;
        Ok(Self { section, listing })
    }
}

impl RequestBuilder for SectionRequest {
    fn prompt(&self) -> &str {
        self.listing.prompt()
    }

    fn endpoint_path(&self, _streaming: bool) -> &'static str {
        "/regenerate-section"
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let form = self
            .listing
            .form()?
            .text("section", self.section.as_str());
        Ok(request.multipart(form))
    }

    fn name(&self) -> &'static str {
        "regenerate-section"
    }
}

/// Explicit consumer-side configuration; nothing is read from the process
/// environment at request time.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ConsumerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Owns one request lifecycle end-to-end: validates, submits, consumes the
/// framed stream, and exposes the accumulated result as it grows.
///
/// At most one request is in flight; a new submission discards the previous
/// buffer and terminal state before doing anything else, so a stale stream
/// can never interleave into the fresh result.
pub struct Orchestrator {
    client: reqwest::Client,
    config: ConsumerConfig,
    phase: RequestPhase,
    consumer: StreamConsumer,
}

impl Orchestrator {
    pub fn new(config: ConsumerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RelayError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            phase: RequestPhase::Idle,
            consumer: StreamConsumer::new(),
        })
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    /// The caller-visible accumulated result of the current request.
    /// Partial text from a failed stream stays visible here.
    pub fn result(&self) -> &str {
        self.consumer.text()
    }

    /// Discard any prior request state and validate the new submission.
    /// On a validation failure no network call is made and the phase is
    /// back at `Idle`.
    fn begin(&mut self, request: &dyn RequestBuilder) -> Result<()> {
        self.consumer = StreamConsumer::new();
        self.phase = RequestPhase::Idle;

        if request.prompt().trim().is_empty() {
            return Err(RelayError::Validation(
                "Prompt must not be empty".to_string(),
            ));
        }

        self.phase = RequestPhase::Submitting;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(
        &mut self,
        request: &dyn RequestBuilder,
        streaming: bool,
    ) -> Result<reqwest::Response> {
        let url = self.url(request.endpoint_path(streaming));
        info!(variant = request.name(), %url, "Submitting generation request");

        let response = request
            .apply(self.client.post(&url))?
            .send()
            .await
            .map_err(|e| {
                self.phase = RequestPhase::Failed;
                RelayError::Transport(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            self.phase = RequestPhase::Failed;
            error!(%status, "Relay returned failure status");
            return Err(RelayError::Transport(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        Ok(response)
    }

    /// Submit a request and consume the streamed response incrementally.
    /// `on_delta` observes the full accumulated text after every delta.
    pub async fn submit_streaming(
        &mut self,
        request: &dyn RequestBuilder,
        on_delta: impl FnMut(&str),
    ) -> Result<&str> {
        self.begin(request)?;
        let response = self.send(request, true).await?;
        self.consume(response.bytes_stream(), on_delta).await
    }

    /// Submit a request and wait for the complete JSON body. Bypasses the
    /// framing path entirely: `Submitting -> Completed` in a single step.
    pub async fn submit<T: serde::de::DeserializeOwned>(
        &mut self,
        request: &dyn RequestBuilder,
    ) -> Result<T> {
        self.begin(request)?;
        let response = self.send(request, false).await?;

        match response.json::<T>().await {
            Ok(generated) => {
                self.phase = RequestPhase::Completed;
                Ok(generated)
            }
            Err(e) => {
                self.phase = RequestPhase::Failed;
                Err(RelayError::Protocol(format!(
                    "Malformed response body: {}",
                    e
                )))
            }
        }
    }

    /// Drive the framed byte stream to completion, folding deltas into the
    /// result buffer. Public seam for feeding pre-recorded chunk sequences.
    pub async fn consume<S, E>(
        &mut self,
        stream: S,
        mut on_delta: impl FnMut(&str),
    ) -> Result<&str>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        self.phase = RequestPhase::Streaming;

        match self.drain(stream, &mut on_delta).await {
            Ok(()) => {
                self.phase = RequestPhase::Completed;
                Ok(self.consumer.text())
            }
            Err(e) => {
                self.phase = RequestPhase::Failed;
                error!(error = %e, "Stream consumption failed");
                Err(e)
            }
        }
    }

    async fn drain<S, E>(&mut self, stream: S, on_delta: &mut impl FnMut(&str)) -> Result<()>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        futures::pin_mut!(stream);

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| RelayError::Transport(format!("Stream read failed: {}", e)))?;
            if self.consumer.push_chunk(&chunk, &mut *on_delta)? == ConsumeStatus::Done {
                return Ok(());
            }
        }

        // Natural end-of-stream without a terminal frame: flush any trailing
        // unterminated frame and complete.
        self.consumer.finish(on_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(ConsumerConfig::new("http://127.0.0.1:9")).unwrap()
    }

    fn chunks(parts: &[&str]) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> {
        let owned: Vec<_> = parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
            .collect();
        stream::iter(owned)
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_network() {
        let mut orch = orchestrator();
        let request = WritingParams {
            prompt: "   \n\t ".to_string(),
            writing_type: "general".to_string(),
            tone: "professional".to_string(),
        };

        let err = orch.submit_streaming(&request, |_| {}).await.unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        assert_eq!(orch.phase(), RequestPhase::Idle);
        assert_eq!(orch.result(), "");
    }

    #[tokio::test]
    async fn test_consume_reaches_completed() {
        let mut orch = orchestrator();
        let result = orch
            .consume(chunks(&["data: Hello\n\n", "data: [DONE]\n\n"]), |_| {})
            .await
            .unwrap()
            .to_string();

        assert_eq!(result, "Hello");
        assert_eq!(orch.phase(), RequestPhase::Completed);
    }

    #[tokio::test]
    async fn test_consume_error_frame_reaches_failed() {
        let mut orch = orchestrator();
        let err = orch
            .consume(chunks(&["data: [ERROR] boom\n\n"]), |_| {})
            .await
            .unwrap_err();

        assert!(err.to_string().contains("[ERROR] boom"));
        assert_eq!(orch.phase(), RequestPhase::Failed);
    }

    #[tokio::test]
    async fn test_transport_error_mid_stream_keeps_partial_text() {
        let mut orch = orchestrator();
        let parts: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: partial\n\n")),
            Err(std::io::Error::other("connection reset")),
        ];

        let err = orch.consume(stream::iter(parts), |_| {}).await.unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
        assert_eq!(orch.phase(), RequestPhase::Failed);
        assert_eq!(orch.result(), "partial");
    }

    #[tokio::test]
    async fn test_new_submission_discards_prior_buffer() {
        let mut orch = orchestrator();
        orch.consume(chunks(&["data: old\n\ndata: [DONE]\n\n"]), |_| {})
            .await
            .unwrap();
        assert_eq!(orch.result(), "old");

        // Empty-prompt submission still resets the previous result
        let request = WritingParams {
            prompt: String::new(),
            writing_type: "general".to_string(),
            tone: "professional".to_string(),
        };
        let _ = orch.submit_streaming(&request, |_| {}).await;
        assert_eq!(orch.result(), "");
        assert_eq!(orch.phase(), RequestPhase::Idle);
    }

    #[test]
    fn test_image_validation_limits() {
        let ok = ImageAttachment {
            file_name: "front.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0u8; 1024],
        };
        assert!(validate_images(std::slice::from_ref(&ok)).is_ok());

        let oversized = ImageAttachment {
            bytes: vec![0u8; MAX_IMAGE_BYTES + 1],
            ..ok.clone()
        };
        assert!(validate_images(&[oversized]).is_err());

        let wrong_type = ImageAttachment {
            content_type: "image/gif".to_string(),
            ..ok.clone()
        };
        assert!(validate_images(&[wrong_type]).is_err());

        let too_many: Vec<_> = (0..=MAX_IMAGE_COUNT).map(|_| ok.clone()).collect();
        assert!(validate_images(&too_many).is_err());
    }

    #[test]
    fn test_endpoint_paths() {
        let writing = WritingParams {
            prompt: "p".to_string(),
            writing_type: "general".to_string(),
            tone: "professional".to_string(),
        };
        assert_eq!(writing.endpoint_path(true), "/generate/stream");
        assert_eq!(writing.endpoint_path(false), "/generate");

        let listing = ListingRequest::new(ListingParams::default(), Vec::new()).unwrap();
        assert_eq!(listing.endpoint_path(true), "/generate-listing");

        let section =
            SectionRequest::new(ListingSection::Social, ListingParams::default()).unwrap();
        assert_eq!(section.endpoint_path(false), "/regenerate-section");
    }
}

use axum::{
    Json,
    Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{Response, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use bytes::{BufMut, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::client::{AnthropicClient, ByteStream};
use crate::error::{RelayError, Result};
use crate::models::api::{
    GenerationResponse, ListingParams, ListingResponse, ListingSection, SectionResponse, Usage,
    WritingParams,
};
use crate::orchestrator::{ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES, MAX_IMAGE_COUNT};
use crate::prompt::{listing_prompt, listing_system_prompt, writing_system_prompt};
use crate::streaming::{AnthropicStreamParser, DATA_PREFIX, DONE_SENTINEL, UpstreamEvent};

pub struct AppState {
    pub client: AnthropicClient,
}

/// Full relay route table. Body limit covers five 5 MB images plus fields.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/generate", post(handle_generate))
        .route("/generate/stream", post(handle_generate_stream))
        .route("/generate-listing", post(handle_generate_listing))
        .route("/regenerate-section", post(handle_regenerate_section))
        .layer(DefaultBodyLimit::max(6 * MAX_IMAGE_BYTES))
        .with_state(state)
}

async fn handle_root() -> impl IntoResponse {
    Json(json!({
        "message": "Writing assistant relay",
        "endpoints": {
            "/generate": "POST - Generate content (full response)",
            "/generate/stream": "POST - Generate content (streaming response)",
            "/generate-listing": "POST - Generate a real-estate listing",
            "/regenerate-section": "POST - Regenerate one listing section"
        }
    }))
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

fn error_response(e: RelayError) -> axum::response::Response {
    let status = match &e {
        RelayError::Validation(_) => StatusCode::BAD_REQUEST,
        RelayError::Upstream(_) | RelayError::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string()).into_response()
}

fn validate_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(RelayError::Validation(
            "Prompt must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub async fn handle_generate(
    State(state): State<Arc<AppState>>,
    Json(params): Json<WritingParams>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    info!(%request_id, writing_type = %params.writing_type, tone = %params.tone, "generate");

    if let Err(e) = validate_prompt(&params.prompt) {
        error!(%request_id, "Validation failed: {}", e);
        return error_response(e);
    }

    let system = writing_system_prompt(&params.writing_type, &params.tone);
    match state.client.create_message(system, &params.prompt).await {
        Ok(message) => Json(GenerationResponse {
            content: message.text(),
            model: message.model.clone(),
            usage: Usage {
                input_tokens: message.usage.input_tokens,
                output_tokens: message.usage.output_tokens,
            },
        })
        .into_response(),
        Err(e) => {
            error!(%request_id, "Generation failed: {}", e);
            error_response(e)
        }
    }
}

pub async fn handle_generate_stream(
    State(state): State<Arc<AppState>>,
    Json(params): Json<WritingParams>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    info!(%request_id, writing_type = %params.writing_type, tone = %params.tone, "generate/stream");

    if let Err(e) = validate_prompt(&params.prompt) {
        error!(%request_id, "Validation failed: {}", e);
        return error_response(e);
    }

    let system = writing_system_prompt(&params.writing_type, &params.tone);

    // Failures from here on are reported in-band as an [ERROR] frame: the
    // response status is already committed once streaming begins, so the
    // pre-stream path does the same for a uniform wire contract.
    let body = match state.client.stream_message(system, &params.prompt).await {
        Ok(upstream) => Body::from_stream(relay_frames(upstream)),
        Err(e) => {
            error!(%request_id, "Upstream stream failed: {}", e);
            Body::from(error_frame(&e.to_string()))
        }
    };

    sse_response(body)
}

fn sse_response(body: Body) -> axum::response::Response {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/event-stream")
        .header("Cache-Control", "no-cache")
        .header("Connection", "keep-alive")
        .body(body)
        .unwrap()
}

fn text_frame(payload: &str) -> String {
    format!("{}{}\n\n", DATA_PREFIX, payload)
}

fn error_frame(message: &str) -> String {
    format!("{}[ERROR] {}\n\n", DATA_PREFIX, message)
}

/// Re-frame the provider's SSE stream as the relay wire format: one
/// `data: <text>` frame per delta, `data: [DONE]` on message stop, and any
/// failure surfaced in-band as a `data: [ERROR] ...` frame.
fn relay_frames(upstream: ByteStream) -> impl Stream<Item = std::io::Result<Bytes>> {
    let mut parser = AnthropicStreamParser::new();
    let mut finished = false;

    upstream.map(move |chunk_result| {
        if finished {
            return Ok(Bytes::new());
        }

        match chunk_result {
            Ok(chunk) => {
                let mut out = BytesMut::new();
                for event in parser.feed(&chunk) {
                    match event {
                        UpstreamEvent::TextDelta(text) => {
                            out.put(text_frame(&text).as_bytes());
                        }
                        UpstreamEvent::Stop => {
                            finished = true;
                            out.put(text_frame(DONE_SENTINEL).as_bytes());
                        }
                        UpstreamEvent::Error(message) => {
                            finished = true;
                            out.put(error_frame(&message).as_bytes());
                        }
                    }
                }
                Ok(out.freeze())
            }
            Err(e) => {
                finished = true;
                Ok(Bytes::from(error_frame(&e.to_string())))
            }
        }
    })
}

/// Parsed `/generate-listing` and `/regenerate-section` form
struct ListingForm {
    params: ListingParams,
    section: Option<ListingSection>,
    image_count: usize,
}

async fn parse_listing_form(mut multipart: Multipart) -> Result<ListingForm> {
    let mut params = ListingParams::default();
    let mut section = None;
    let mut image_count = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "images" {
            image_count += 1;
            if image_count > MAX_IMAGE_COUNT {
                return Err(RelayError::Validation(format!(
                    "Too many images (max {})",
                    MAX_IMAGE_COUNT
                )));
            }

            let content_type = field.content_type().unwrap_or_default().to_string();
            if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
                return Err(RelayError::Validation(format!(
                    "Unsupported image type: {}",
                    content_type
                )));
            }

            let data = field
                .bytes()
                .await
                .map_err(|e| RelayError::Validation(format!("Failed to read image: {}", e)))?;
            if data.len() > MAX_IMAGE_BYTES {
                return Err(RelayError::Validation(format!(
                    "Image too large: {} bytes (max {})",
                    data.len(),
                    MAX_IMAGE_BYTES
                )));
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| RelayError::Validation(format!("Failed to read field {}: {}", name, e)))?;

        match name.as_str() {
            "property_type" => params.property_type = value,
            "listing_purpose" => params.listing_purpose = value,
            "bedrooms" => params.bedrooms = value,
            "bathrooms" => params.bathrooms = value,
            "sqft" => params.sqft = value,
            "price" => params.price = value,
            "address" => params.address = value,
            "features" => {
                params.features = serde_json::from_str(&value).map_err(|e| {
                    RelayError::Validation(format!("features must be a JSON array: {}", e))
                })?;
            }
            "additional_notes" => params.additional_notes = value,
            "section" => {
                section = Some(ListingSection::parse(&value).ok_or_else(|| {
                    RelayError::Validation(format!("Unknown section: {}", value))
                })?);
            }
            // Unknown fields are form noise, not errors
            _ => {}
        }
    }

    Ok(ListingForm {
        params,
        section,
        image_count,
    })
}

async fn generate_section(
    state: &AppState,
    params: &ListingParams,
    section: ListingSection,
) -> Result<(String, Usage)> {
    let prompt = listing_prompt(params);
    let message = state
        .client
        .create_message(listing_system_prompt(section), &prompt)
        .await?;
    let usage = Usage {
        input_tokens: message.usage.input_tokens,
        output_tokens: message.usage.output_tokens,
    };
    Ok((message.text(), usage))
}

pub async fn handle_generate_listing(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();

    let form = match parse_listing_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            error!(%request_id, "Listing form rejected: {}", e);
            return error_response(e);
        }
    };
    info!(%request_id, address = %form.params.address, images = form.image_count, "generate-listing");

    let description = match generate_section(&state, &form.params, ListingSection::Description).await
    {
        Ok(result) => result,
        Err(e) => {
            error!(%request_id, "Listing description failed: {}", e);
            return error_response(e);
        }
    };
    let social = match generate_section(&state, &form.params, ListingSection::Social).await {
        Ok(result) => result,
        Err(e) => {
            error!(%request_id, "Listing social post failed: {}", e);
            return error_response(e);
        }
    };

    Json(ListingResponse {
        description: description.0,
        social: social.0,
        model: state.client.model().to_string(),
        usage: Usage {
            input_tokens: description.1.input_tokens + social.1.input_tokens,
            output_tokens: description.1.output_tokens + social.1.output_tokens,
        },
    })
    .into_response()
}

pub async fn handle_regenerate_section(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();

    let form = match parse_listing_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            error!(%request_id, "Section form rejected: {}", e);
            return error_response(e);
        }
    };

    let Some(section) = form.section else {
        return error_response(RelayError::Validation(
            "Missing section field".to_string(),
        ));
    };
    info!(%request_id, section = section.as_str(), "regenerate-section");

    match generate_section(&state, &form.params, section).await {
        Ok((content, usage)) => Json(SectionResponse {
            section: section.as_str().to_string(),
            content,
            model: state.client.model().to_string(),
            usage,
        })
        .into_response(),
        Err(e) => {
            error!(%request_id, "Section regeneration failed: {}", e);
            error_response(e)
        }
    }
}

use serde::{Deserialize, Serialize};

/// Generation request accepted by `/generate` and `/generate/stream`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WritingParams {
    /// The user's writing request
    pub prompt: String,

    /// Kind of writing to produce (blog post, email, ...)
    #[serde(default = "default_writing_type")]
    pub writing_type: String,

    /// Requested tone of voice
    #[serde(default = "default_tone")]
    pub tone: String,
}

fn default_writing_type() -> String {
    "general".to_string()
}

fn default_tone() -> String {
    "professional".to_string()
}

/// Non-streaming response body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationResponse {
    /// The generated text
    pub content: String,

    /// Which model produced it
    pub model: String,

    /// Token usage reported by the provider
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Structured fields of a real-estate listing request.
///
/// Arrives as multipart form fields; `features` is a JSON-encoded array
/// carried as a single string field.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListingParams {
    pub property_type: String,
    pub listing_purpose: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub sqft: String,
    pub price: String,
    pub address: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub additional_notes: String,
}

/// Response body for the listing endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingResponse {
    pub description: String,
    pub social: String,
    pub model: String,
    pub usage: Usage,
}

/// Which part of a listing to regenerate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSection {
    Description,
    Social,
}

impl ListingSection {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "description" => Some(Self::Description),
            "social" => Some(Self::Social),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Social => "social",
        }
    }
}

/// Response body for `/regenerate-section`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectionResponse {
    pub section: String,
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

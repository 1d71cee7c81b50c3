//! System prompts sent to the model for each endpoint.

use crate::models::api::{ListingParams, ListingSection};

/// System prompt for the generic writing assistant
pub fn writing_system_prompt(writing_type: &str, tone: &str) -> String {
    format!(
        "You are an expert writing assistant. Your task is to help users \n\
         with their writing needs.\n\
         \n\
         Writing Type: {writing_type}\n\
         Tone: {tone}\n\
         \n\
         Guidelines:\n\
         - Produce high-quality, engaging content\n\
         - Match the requested tone and style\n\
         - Be creative while staying on topic\n\
         - Format the output appropriately for the writing type\n\
         - If writing code examples, use proper formatting"
    )
}

/// System prompt for one listing section
pub fn listing_system_prompt(section: ListingSection) -> String {
    let task = match section {
        ListingSection::Description => {
            "Write a compelling property listing description. Lead with the \
             strongest selling points, cover layout and location, and close \
             with a call to action. Keep it under 250 words."
        }
        ListingSection::Social => {
            "Write a short, punchy social-media post announcing this listing. \
             Two or three sentences, a few tasteful emoji, and end with a \
             call to action. No hashtag walls."
        }
    };

    format!(
        "You are an expert real-estate copywriter.\n\
         \n\
         Task: {task}\n\
         \n\
         Guidelines:\n\
         - Be accurate: only mention details present in the property facts\n\
         - Match the listing purpose (sale vs. rental) in framing and wording\n\
         - Avoid fair-housing violations: describe the property, not the buyer"
    )
}

/// The user-turn prompt built from listing form fields
pub fn listing_prompt(params: &ListingParams) -> String {
    let mut prompt = format!(
        "Property facts:\n\
         - Type: {}\n\
         - Purpose: {}\n\
         - Bedrooms: {}\n\
         - Bathrooms: {}\n\
         - Square footage: {}\n\
         - Price: {}\n\
         - Address: {}",
        params.property_type,
        params.listing_purpose,
        params.bedrooms,
        params.bathrooms,
        params.sqft,
        params.price,
        params.address,
    );

    if !params.features.is_empty() {
        prompt.push_str("\n- Features: ");
        prompt.push_str(&params.features.join(", "));
    }

    if !params.additional_notes.trim().is_empty() {
        prompt.push_str("\n\nAdditional notes: ");
        prompt.push_str(&params.additional_notes);
    }

    prompt
}

//! Builds `generateContent` bodies for the generate and edit relays.
//!
//! Both shapes share the same fixed sampling parameters and safety override;
//! they differ only in the parts of the single user turn.

use super::types::{
    Content, GenerateContentRequest, GenerationConfig, InlineData, Part, SafetySetting,
};
use crate::ai::mime::split_image_data;

const TEMPERATURE: f64 = 1.0;
const TOP_P: f64 = 0.95;
const TOP_K: u32 = 40;
const MAX_OUTPUT_TOKENS: u32 = 8192;
const RESPONSE_MODALITIES: [&str; 2] = ["image", "text"];

/// Body for a text-to-image request: one user turn with one text part.
pub fn build_generate_body(prompt: &str) -> GenerateContentRequest {
    with_parts(vec![Part::Text {
        text: prompt.to_string(),
    }])
}

/// Body for an image edit: the source image part comes before the instruction.
///
/// The image is forwarded as-is; malformed data is left for the upstream to
/// reject.
pub fn build_edit_body(prompt: &str, image_base64: &str) -> GenerateContentRequest {
    let (mime_type, data) = split_image_data(image_base64);

    with_parts(vec![
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            },
        },
        Part::Text {
            text: prompt.to_string(),
        },
    ])
}

fn with_parts(parts: Vec<Part>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            top_p: TOP_P,
            top_k: TOP_K,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            response_modalities: RESPONSE_MODALITIES.iter().map(|m| m.to_string()).collect(),
        },
        safety_settings: vec![SafetySetting {
            category: "HARM_CATEGORY_CIVIC_INTEGRITY".to_string(),
            threshold: "BLOCK_NONE".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_body_has_single_text_part() {
        let body = serde_json::to_value(build_generate_body("a red cube")).unwrap();

        assert_eq!(
            body["contents"],
            serde_json::json!([{ "role": "user", "parts": [{ "text": "a red cube" }] }])
        );
    }

    #[test]
    fn test_edit_body_puts_image_before_text() {
        let body = serde_json::to_value(build_edit_body("make it blue", "/9j/4AAQ")).unwrap();

        assert_eq!(
            body["contents"][0]["parts"],
            serde_json::json!([
                { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/4AAQ" } },
                { "text": "make it blue" }
            ])
        );
    }

    #[test]
    fn test_edit_body_strips_data_url_prefix() {
        let body = build_edit_body("crop", "data:image/png;base64,iVBORw0K");

        match &body.contents[0].parts[0] {
            Part::InlineData { inline_data } => {
                assert_eq!(inline_data.mime_type, "image/png");
                assert_eq!(inline_data.data, "iVBORw0K");
            }
            other => panic!("expected inline image part, got {:?}", other),
        }
    }

    #[test]
    fn test_bodies_share_fixed_generation_and_safety_config() {
        for body in [
            build_generate_body("p"),
            build_edit_body("p", "AAAA"),
        ] {
            let json = serde_json::to_value(&body).unwrap();
            assert_eq!(
                json["generationConfig"],
                serde_json::json!({
                    "temperature": 1.0,
                    "topP": 0.95,
                    "topK": 40,
                    "maxOutputTokens": 8192,
                    "responseModalities": ["image", "text"]
                })
            );
            assert_eq!(
                json["safetySettings"],
                serde_json::json!([{
                    "category": "HARM_CATEGORY_CIVIC_INTEGRITY",
                    "threshold": "BLOCK_NONE"
                }])
            );
        }
    }
}

//! Pulls the text and image out of a `generateContent` response.

use super::types::{GenerateContentResponse, InlineData, Part};

/// What a single upstream response yielded. Both fields may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub text: Option<String>,
    pub image: Option<InlineData>,
}

/// Walk the first candidate's parts in order.
///
/// The last text part and the last `image/*` inline part win. Missing
/// candidates, content or parts simply leave the fields empty.
pub fn extract(response: &GenerateContentResponse) -> Extracted {
    let mut extracted = Extracted::default();

    let Some(content) = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
    else {
        return extracted;
    };

    for part in &content.parts {
        match part {
            Part::Text { text } => extracted.text = Some(text.clone()),
            Part::InlineData { inline_data } if inline_data.mime_type.starts_with("image/") => {
                tracing::debug!(
                    "Image received: {} chars, mime type: {}",
                    inline_data.data.len(),
                    inline_data.mime_type
                );
                extracted.image = Some(inline_data.clone());
            }
            Part::InlineData { .. } | Part::Other(_) => {}
        }
    }

    extracted
}

/// Upstream's stated reason for returning no usable content, if any.
pub fn block_reason(response: &GenerateContentResponse) -> Option<&str> {
    response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
        .or_else(|| {
            response
                .candidates
                .first()
                .and_then(|candidate| candidate.finish_reason.as_deref())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extracts_text_and_image() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your cube" },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0K" } }
                    ]
                }
            }]
        }));

        assert_eq!(
            extract(&response),
            Extracted {
                text: Some("Here is your cube".to_string()),
                image: Some(InlineData {
                    mime_type: "image/png".to_string(),
                    data: "iVBORw0K".to_string(),
                }),
            }
        );
    }

    #[test]
    fn test_last_image_and_last_text_win() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "first" },
                        { "inlineData": { "mimeType": "image/png", "data": "FIRST" } },
                        { "text": "second" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "SECOND" } }
                    ]
                }
            }]
        }));

        let extracted = extract(&response);
        assert_eq!(extracted.text.as_deref(), Some("second"));
        assert_eq!(extracted.image.unwrap().data, "SECOND");
    }

    #[test]
    fn test_non_image_inline_data_is_ignored() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "inlineData": { "mimeType": "image/png", "data": "IMG" } },
                        { "inlineData": { "mimeType": "application/pdf", "data": "PDF" } }
                    ]
                }
            }]
        }));

        assert_eq!(extract(&response).image.unwrap().data, "IMG");
    }

    #[test]
    fn test_zero_parts_yields_nothing() {
        let response = parse(serde_json::json!({
            "candidates": [{ "content": { "parts": [] } }]
        }));
        assert_eq!(extract(&response), Extracted::default());
    }

    #[test]
    fn test_missing_structure_yields_nothing() {
        for body in [
            serde_json::json!({}),
            serde_json::json!({ "candidates": [] }),
            serde_json::json!({ "candidates": [{}] }),
            serde_json::json!({ "candidates": [{ "content": {} }] }),
            serde_json::json!({ "candidates": null }),
            serde_json::json!({ "candidates": [{ "content": null }] }),
            serde_json::json!({ "candidates": [{ "content": { "parts": null } }] }),
        ] {
            assert_eq!(extract(&parse(body)), Extracted::default());
        }
    }

    #[test]
    fn test_only_first_candidate_is_read() {
        let response = parse(serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "no image" }] } },
                { "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "X" } }] } }
            ]
        }));
        assert!(extract(&response).image.is_none());
    }

    #[test]
    fn test_block_reason_prefers_prompt_feedback() {
        let response = parse(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" },
            "candidates": [{ "finishReason": "STOP" }]
        }));
        assert_eq!(block_reason(&response), Some("SAFETY"));

        let response = parse(serde_json::json!({
            "candidates": [{ "finishReason": "IMAGE_SAFETY" }]
        }));
        assert_eq!(block_reason(&response), Some("IMAGE_SAFETY"));

        assert_eq!(block_reason(&parse(serde_json::json!({}))), None);
    }
}

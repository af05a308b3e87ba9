use wiremock::matchers::{method, path_regex};
use wiremock::MockBuilder;

pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";

pub fn post_path_regex(path: &str) -> MockBuilder {
    wiremock::Mock::given(method("POST")).and(path_regex(path))
}

/// A `generateContent` body carrying one caption and one PNG part.
pub fn image_response(data: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "Here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": data } }
                ]
            }
        }]
    })
}

//! Data models and structures
//!
//! Inbound request bodies, per-attempt bookkeeping and the reply shapes the
//! relay endpoints return.

use crate::ai::gemini::InlineData;
use crate::Error;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate-image`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: Option<String>,
}

/// Body of `POST /api/edit-image`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditImageRequest {
    pub prompt: Option<String>,
    pub image_data: Option<String>,
}

/// Validated relay input: a prompt plus, for edits, the source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub source_image: Option<String>,
}

impl GenerationRequest {
    pub fn generate(request: GenerateImageRequest) -> crate::Result<Self> {
        Ok(Self {
            prompt: required(request.prompt, "No prompt provided")?,
            source_image: None,
        })
    }

    pub fn edit(request: EditImageRequest) -> crate::Result<Self> {
        let prompt = required(request.prompt, "No prompt provided")?;
        let image = required(request.image_data, "No image data provided")?;
        Ok(Self {
            prompt,
            source_image: Some(image),
        })
    }
}

fn required(value: Option<String>, message: &str) -> crate::Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Validation(message.to_string()))
}

/// Classification of a failed attempt, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    ApiError,
    MissingData,
    Exception,
}

/// One failed upstream attempt. Appended in order, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AttemptKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl AttemptRecord {
    pub fn from_error(attempt: u32, error: &Error) -> Self {
        let (kind, status_code) = match error {
            Error::UpstreamStatus { status, .. } => (AttemptKind::ApiError, Some(*status)),
            Error::MissingImage => (AttemptKind::MissingData, None),
            _ => (AttemptKind::Exception, None),
        };

        Self {
            attempt,
            message: error.to_string(),
            kind,
            status_code,
        }
    }
}

/// Outcome of one relayed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResult {
    pub text: Option<String>,
    pub image: Option<InlineData>,
    /// Attempts actually made, including the final one.
    pub attempts: u32,
    pub max_attempts: u32,
    pub errors: Vec<AttemptRecord>,
    pub succeeded: bool,
}

impl RelayResult {
    pub fn last_error(&self) -> Option<&AttemptRecord> {
        self.errors.last()
    }

    pub fn retry_info(&self) -> RetryInfo {
        RetryInfo {
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            errors: self.errors.clone(),
            success: self.succeeded,
        }
    }
}

/// Attempt history returned to clients as `retryInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryInfo {
    pub attempts: u32,
    pub max_attempts: u32,
    pub errors: Vec<AttemptRecord>,
    pub success: bool,
}

/// `200` reply of the generate and edit endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReply {
    pub text: Option<String>,
    pub image_data: Option<String>,
    pub retry_info: RetryInfo,
}

/// Failure reply once every attempt was spent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReply {
    pub error: String,
    pub retry_info: RetryInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReply {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReply {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexReply {
    pub message: String,
    pub endpoints: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attempt_record_serialization() {
        let record = AttemptRecord::from_error(
            2,
            &Error::UpstreamStatus {
                status: 503,
                message: "overloaded".to_string(),
            },
        );

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({
                "attempt": 2,
                "message": "overloaded",
                "type": "api_error",
                "status_code": 503
            })
        );
    }

    #[test]
    fn test_missing_data_record_omits_status_code() {
        let record = AttemptRecord::from_error(1, &Error::MissingImage);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({
                "attempt": 1,
                "message": "No image data received from API",
                "type": "missing_data"
            })
        );
    }

    #[test]
    fn test_transport_faults_are_exceptions() {
        let record = AttemptRecord::from_error(3, &Error::AiProvider("eof".to_string()));
        assert_eq!(record.kind, AttemptKind::Exception);
        assert_eq!(record.status_code, None);
    }

    #[test]
    fn test_generate_request_requires_prompt() {
        let err = GenerationRequest::generate(GenerateImageRequest { prompt: None }).unwrap_err();
        assert_eq!(err.to_string(), "No prompt provided");

        let err = GenerationRequest::generate(GenerateImageRequest {
            prompt: Some("  ".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_edit_request_checks_prompt_before_image() {
        let err = GenerationRequest::edit(EditImageRequest::default()).unwrap_err();
        assert_eq!(err.to_string(), "No prompt provided");

        let err = GenerationRequest::edit(EditImageRequest {
            prompt: Some("make it blue".to_string()),
            image_data: None,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "No image data provided");
    }

    #[test]
    fn test_edit_request_deserializes_camel_case() {
        let request: EditImageRequest =
            serde_json::from_str(r#"{"prompt":"p","imageData":"AAAA"}"#).unwrap();
        let request = GenerationRequest::edit(request).unwrap();
        assert_eq!(request.source_image.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_image_reply_keeps_null_text() {
        let reply = ImageReply {
            text: None,
            image_data: Some("AAAA".to_string()),
            retry_info: RetryInfo {
                attempts: 1,
                max_attempts: 3,
                errors: vec![],
                success: true,
            },
        };

        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            serde_json::json!({
                "text": null,
                "imageData": "AAAA",
                "retryInfo": { "attempts": 1, "max_attempts": 3, "errors": [], "success": true }
            })
        );
    }
}

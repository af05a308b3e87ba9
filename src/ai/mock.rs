use super::gemini::{GenerateContentRequest, GenerateContentResponse};
use super::{ApiKey, CredentialProvider, UpstreamService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted outcome for one upstream call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Well-formed response with an optional caption and one PNG part.
    Image { text: Option<String>, data: String },
    /// Well-formed response with no image part.
    TextOnly(String),
    /// Non-success HTTP status with an upstream error message.
    Status(u16, String),
    /// Transport or parse fault.
    Fault(String),
}

impl MockReply {
    pub fn image(data: &str) -> Self {
        MockReply::Image {
            text: None,
            data: data.to_string(),
        }
    }

    fn into_result(self) -> Result<GenerateContentResponse> {
        let body = match self {
            MockReply::Image { text, data } => {
                let mut parts = Vec::new();
                if let Some(text) = text {
                    parts.push(serde_json::json!({ "text": text }));
                }
                parts.push(serde_json::json!({
                    "inlineData": { "mimeType": "image/png", "data": data }
                }));
                serde_json::json!({ "candidates": [{ "content": { "parts": parts } }] })
            }
            MockReply::TextOnly(text) => serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": text }] } }]
            }),
            MockReply::Status(status, message) => {
                return Err(Error::UpstreamStatus { status, message })
            }
            MockReply::Fault(message) => return Err(Error::AiProvider(message)),
        };

        Ok(serde_json::from_value(body)?)
    }
}

/// Upstream stand-in that replays scripted replies in order, repeating the
/// last one once the script runs out.
#[derive(Clone)]
pub struct MockUpstreamClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<(String, GenerateContentRequest)>>>,
}

impl MockUpstreamClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Keys used for each call, in call order.
    pub fn keys_used(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<GenerateContentRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

impl Default for MockUpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamService for MockUpstreamClient {
    async fn generate_content(
        &self,
        api_key: &ApiKey,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let call_index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((api_key.expose().to_string(), request.clone()));
            requests.len() - 1
        };

        let reply = {
            let replies = self.replies.lock().unwrap();
            match replies.get(call_index).or_else(|| replies.last()) {
                Some(reply) => reply.clone(),
                // Default: a tiny image on every call
                None => MockReply::image("iVBORw0KGgo="),
            }
        };

        reply.into_result()
    }
}

/// Single-key credential source that counts how often it was asked.
#[derive(Clone)]
pub struct CountingCredential {
    key: ApiKey,
    selections: Arc<AtomicUsize>,
}

impl CountingCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: ApiKey::new(key.into()),
            selections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn selection_count(&self) -> usize {
        self.selections.load(Ordering::SeqCst)
    }
}

impl CredentialProvider for CountingCredential {
    fn select_credential(&self) -> &ApiKey {
        self.selections.fetch_add(1, Ordering::SeqCst);
        &self.key
    }

    fn key_count(&self) -> usize {
        1
    }
}

//! Upstream invocation with bounded retry and per-attempt key rotation.
//!
//! Each inbound request drives one [`AttemptState`] machine:
//!
//! ```text
//! Attempting(n) --image--> Success
//!      |
//!      +--status / fault / no image--> Retryable(n) --delay--> Attempting(n+1)
//!                                           |
//!                                           +--ceiling reached--> Exhausted
//! ```
//!
//! Attempts are strictly sequential. The inter-attempt wait is an async sleep,
//! so a retrying request never holds up other requests.

use crate::ai::gemini::extract::block_reason;
use crate::ai::gemini::{extract, Extracted, GenerateContentRequest};
use crate::ai::{CredentialProvider, UpstreamService};
use crate::models::{AttemptRecord, RelayResult};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tracing::{info, warn};

/// Attempt ceiling per inbound request.
pub const MAX_ATTEMPTS: u32 = 3;
/// Pause between a failed attempt and the next one.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below one is raised to one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// One delay per retry; running out of delays means the ceiling is reached.
    fn delays(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.delay).take(self.max_attempts as usize - 1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, RETRY_DELAY)
    }
}

#[derive(Debug)]
enum AttemptState {
    Attempting { attempt: u32 },
    Retryable { attempt: u32, error: Error },
    Success { attempt: u32, extracted: Extracted },
    Exhausted { attempt: u32 },
}

/// Sends one payload upstream until an image comes back or attempts run out.
#[derive(Clone)]
pub struct Relay {
    upstream: Arc<dyn UpstreamService>,
    credentials: Arc<dyn CredentialProvider>,
    policy: RetryPolicy,
}

impl Relay {
    pub fn new(
        upstream: Arc<dyn UpstreamService>,
        credentials: Arc<dyn CredentialProvider>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            upstream,
            credentials,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run the attempt state machine to a terminal state.
    pub async fn invoke(&self, payload: &GenerateContentRequest) -> RelayResult {
        let max_attempts = self.policy.max_attempts;
        let mut delays = self.policy.delays();
        let mut errors: Vec<AttemptRecord> = Vec::new();
        let mut state = AttemptState::Attempting { attempt: 1 };

        loop {
            state = match state {
                AttemptState::Attempting { attempt } => {
                    info!("Attempt {}/{}", attempt, max_attempts);
                    match self.attempt(payload).await {
                        Ok(extracted) => AttemptState::Success { attempt, extracted },
                        Err(error) => AttemptState::Retryable { attempt, error },
                    }
                }
                AttemptState::Retryable { attempt, error } => {
                    warn!("Attempt {}/{} failed: {}", attempt, max_attempts, error);
                    errors.push(AttemptRecord::from_error(attempt, &error));

                    match delays.next() {
                        Some(delay) if error.is_retryable() => {
                            tokio::time::sleep(delay).await;
                            AttemptState::Attempting {
                                attempt: attempt + 1,
                            }
                        }
                        _ => AttemptState::Exhausted { attempt },
                    }
                }
                AttemptState::Success { attempt, extracted } => {
                    info!("Received image on attempt {}/{}", attempt, max_attempts);
                    return RelayResult {
                        text: extracted.text,
                        image: extracted.image,
                        attempts: attempt,
                        max_attempts,
                        errors,
                        succeeded: true,
                    };
                }
                AttemptState::Exhausted { attempt } => {
                    warn!("Giving up after {}/{} attempts", attempt, max_attempts);
                    return RelayResult {
                        text: None,
                        image: None,
                        attempts: attempt,
                        max_attempts,
                        errors,
                        succeeded: false,
                    };
                }
            };
        }
    }

    async fn attempt(&self, payload: &GenerateContentRequest) -> Result<Extracted> {
        let api_key = self.credentials.select_credential();
        let response = self.upstream.generate_content(api_key, payload).await?;
        let extracted = extract(&response);

        if extracted.image.is_none() {
            if let Some(reason) = block_reason(&response) {
                warn!("Upstream returned no image (reason: {})", reason);
            }
            return Err(Error::MissingImage);
        }

        Ok(extracted)
    }
}

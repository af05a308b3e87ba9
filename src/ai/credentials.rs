//! Upstream credential selection.
//!
//! The pool is built once at startup and shared read-only across requests.

use crate::{Error, Result};
use rand::seq::SliceRandom;
use std::fmt;

/// An upstream API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: String) -> Self {
        Self(key)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Source of a credential for each upstream attempt.
pub trait CredentialProvider: Send + Sync {
    fn select_credential(&self) -> &ApiKey;

    /// Number of distinct credentials available.
    fn key_count(&self) -> usize;
}

/// Interchangeable keys, one picked uniformly at random per call.
#[derive(Debug)]
pub struct CredentialPool {
    keys: Vec<ApiKey>,
}

impl CredentialPool {
    /// Fails with [`Error::Config`] when no usable key is given.
    pub fn new(keys: Vec<String>) -> Result<Self> {
        let keys: Vec<ApiKey> = keys
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(ApiKey::new)
            .collect();

        if keys.is_empty() {
            return Err(Error::Config(
                "No Gemini API keys configured; set at least GEMINI_API_KEY_01".to_string(),
            ));
        }

        Ok(Self { keys })
    }
}

impl CredentialProvider for CredentialPool {
    fn select_credential(&self) -> &ApiKey {
        self.keys
            .choose(&mut rand::thread_rng())
            .expect("CredentialPool is non-empty by construction")
    }

    fn key_count(&self) -> usize {
        self.keys.len()
    }
}

/// Always hands out the same key. Used where selection must be predictable.
#[derive(Debug, Clone)]
pub struct FixedCredential {
    key: ApiKey,
}

impl FixedCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: ApiKey::new(key.into()),
        }
    }
}

impl CredentialProvider for FixedCredential {
    fn select_credential(&self) -> &ApiKey {
        &self.key
    }

    fn key_count(&self) -> usize {
        1
    }
}

//! Image relay - forwards image generation and editing requests to Gemini
//!
//! Accepts a prompt (and optionally a source image) over HTTP, sends it to the
//! Gemini `generateContent` API with a rotating API key, retries up to a fixed
//! ceiling when no image comes back, and returns the image with the full
//! attempt history.

pub mod ai;
pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod relay;
pub mod server;

pub use error::{Error, Result};

pub mod client;
pub mod extract;
pub mod payload;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::GeminiHttpClient;
pub use extract::{extract, Extracted};
pub use payload::{build_edit_body, build_generate_body};
pub use types::{GenerateContentRequest, GenerateContentResponse, InlineData};

//! Checklist generation: raw free-text in, ordered task strings out.
//!
//! One prompt, one completion, one parse. Blank input is rejected before any
//! network traffic. No retries here: the caller decides whether to ask the
//! user to resubmit.

pub mod client;
pub mod prompt;
pub mod sanitize;

use tracing::{info, warn};

pub use client::{GeminiClient, InferenceClient};

/// Generation failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Raw input was empty or whitespace-only; nothing was sent anywhere.
    #[error("raw input is empty")]
    EmptyInput,

    /// The inference endpoint could not be reached or answered non-success.
    #[error("inference request failed: {0}")]
    Network(String),

    /// The reply parsed but held no usable tasks (or was not an array).
    #[error("inference reply contained no tasks")]
    Empty,

    /// The reply was not valid JSON even after sanitization.
    #[error("inference reply was not parseable: {0}")]
    Parse(String),
}

/// Turns raw text into an ordered list of task strings via one inference
/// call.
pub struct ChecklistGenerator<C> {
    client: C,
}

impl<C: InferenceClient> ChecklistGenerator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Generate tasks from raw input.
    ///
    /// Empty or whitespace-only input returns [`GenerationError::EmptyInput`]
    /// without touching the client. Output ordering follows the reply; any
    /// length >= 1 is accepted.
    pub async fn generate(&self, raw_input: &str) -> Result<Vec<String>, GenerationError> {
        if raw_input.trim().is_empty() {
            return Err(GenerationError::EmptyInput);
        }

        let prompt = prompt::build_prompt(raw_input);
        let reply = self.client.complete(&prompt).await?;

        match sanitize::parse_reply(&reply) {
            Ok(tasks) => {
                info!(
                    client = self.client.name(),
                    count = tasks.len(),
                    "generated checklist"
                );
                Ok(tasks)
            }
            Err(err) => {
                warn!(client = self.client.name(), %err, "unusable inference reply");
                Err(err)
            }
        }
    }
}

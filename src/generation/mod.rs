//! Answer generation providers
//!
//! The pipeline and the triage gate talk to a [`TextGenerator`]; which
//! backend sits behind it is decided once at startup.

pub mod anthropic;
pub mod ollama;

use async_trait::async_trait;

use crate::errors::Result;

pub use anthropic::AnthropicGenerator;
pub use ollama::OllamaGenerator;

/// Single-shot prompt-to-text provider
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for `user_prompt` under `system_prompt`
    async fn generate(&self, system_prompt: &str, user_prompt: &str, max_tokens: u32) -> Result<String>;

    /// Fail with a configuration error if the provider cannot be used
    /// (e.g. a missing credential). Checked before any retrieval work.
    fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Provider name for logs
    fn name(&self) -> &str;
}

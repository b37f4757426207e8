pub mod gemini;
pub mod parse;
pub mod prompt;

pub use gemini::GeminiClient;
pub use parse::parse_structure;
pub use prompt::build_structure_prompt;

use anyhow::Result;
use async_trait::async_trait;

/// Seam between the collector and the hosted model. The production
/// implementation is [`GeminiClient`]; tests script this trait instead.
#[async_trait]
pub trait Generate {
    /// Produce raw text for `prompt`. May fail (network, auth, rate limit)
    /// or return text that does not parse; callers decide what to do.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

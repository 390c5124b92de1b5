use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DialogError;

/// A generative language backend that answers a prompt with JSON text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sends `prompt` and returns the raw text of the reply. The backend is
    /// asked for `application/json` output but the text is not validated here.
    async fn generate_json(&self, prompt: &str) -> Result<String, DialogError>;
}

pub mod gemini;

pub use gemini::Gemini;

pub(crate) type SharedLanguageModel = Arc<dyn LanguageModel>;

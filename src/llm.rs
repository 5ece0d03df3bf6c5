use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::Ollama;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::GenerationError;

/// Turns a fully rendered prompt into a completion. Implementations keep no
/// state between calls.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Passes a completion through unchanged unless it is blank.
pub fn require_text(completion: String) -> Result<String, GenerationError> {
    if completion.trim().is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(completion)
}

pub struct OllamaGenerator {
    client: Ollama,
    model: String,
}

impl OllamaGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        OllamaGenerator {
            client: Ollama::new(config.host.clone(), config.port),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerationRequest::new(self.model.clone(), prompt.to_string());

        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            completion_chars = response.response.len(),
            "completion received"
        );

        Ok(response.response)
    }
}

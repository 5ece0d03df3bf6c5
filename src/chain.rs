use async_trait::async_trait;

use crate::error::ChainError;
use crate::history::ConversationHistory;

/// A prompt-render-then-generate step over one question.
#[async_trait]
pub trait Chain: Send + Sync {
    type Output: Send;

    async fn run(
        &self,
        input: &str,
        history: &ConversationHistory,
    ) -> Result<Self::Output, ChainError>;
}

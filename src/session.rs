//! One user's conversation with one database.

use tracing::{info, info_span, warn, Instrument};

use crate::error::SessionError;
use crate::history::ConversationHistory;
use crate::text_to_sql_chain::TextToSqlChain;

/// Owns the conversation history and, once connected, the pipeline bound to
/// this session's database handle. Turns run one at a time through `&mut self`.
pub struct Session {
    history: ConversationHistory,
    chain: Option<TextToSqlChain>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// An unconnected session holding only the greeting.
    pub fn new() -> Self {
        Session {
            history: ConversationHistory::seeded(),
            chain: None,
        }
    }

    pub fn connect(&mut self, chain: TextToSqlChain) {
        self.chain = Some(chain);
    }

    pub fn is_connected(&self) -> bool {
        self.chain.is_some()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Runs one turn and returns the answer that was appended.
    ///
    /// On failure the question stays in the history but no answer is added.
    pub async fn ask(&mut self, question: &str) -> Result<String, SessionError> {
        let chain = self.chain.as_ref().ok_or(SessionError::NotConnected)?;

        if question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        self.history.push_user(question);

        let span = info_span!("turn", index = self.history.len());
        let result = chain
            .answer(question, &self.history)
            .instrument(span)
            .await;

        match result {
            Ok(response) => {
                self.history.push_assistant(response.clone());
                info!(turns = self.history.len(), "turn complete");
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "turn aborted");
                Err(e.into())
            }
        }
    }
}

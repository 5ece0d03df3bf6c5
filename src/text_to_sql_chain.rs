use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::chain::Chain;
use crate::database::{Database, QueryExecutor, SchemaProvider};
use crate::error::ChainError;
use crate::history::ConversationHistory;
use crate::llm::{require_text, TextGenerator};
use crate::prompt::render_answer_prompt;
use crate::sql_query_chain::SqlQueryChain;

/// Second stage: generates SQL, runs it, and narrates the outcome.
///
/// Execution errors are narrated like any other result. Generation and
/// schema failures end the turn with a [`ChainError`].
pub struct TextToSqlChain {
    client: Arc<dyn TextGenerator>,
    db: Arc<dyn Database>,
    sql_chain: SqlQueryChain,
}

impl TextToSqlChain {
    pub fn new<D>(client: Arc<dyn TextGenerator>, db: Arc<D>) -> Self
    where
        D: Database + 'static,
    {
        let sql_chain = SqlQueryChain::new(client.clone(), db.clone());

        TextToSqlChain {
            client,
            db,
            sql_chain,
        }
    }

    pub async fn answer(
        &self,
        question: &str,
        history: &ConversationHistory,
    ) -> Result<String, ChainError> {
        let sql_query = self.sql_chain.run(question, history).await?;

        let data = self.db.run(&sql_query).await;
        info!(failed = data.is_failure(), "generated query executed");

        let schema = self.db.get_schema().await?;
        let prompt = render_answer_prompt(&schema, history, &sql_query, &data, question);
        debug!(prompt_chars = prompt.len(), "requesting answer");

        let response = require_text(self.client.complete(&prompt).await?)?;

        Ok(response)
    }
}

#[async_trait]
impl Chain for TextToSqlChain {
    type Output = String;

    async fn run(&self, input: &str, history: &ConversationHistory) -> Result<String, ChainError> {
        self.answer(input, history).await
    }
}

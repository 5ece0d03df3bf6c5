use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::chain::Chain;
use crate::database::SchemaProvider;
use crate::error::ChainError;
use crate::history::ConversationHistory;
use crate::llm::{require_text, TextGenerator};
use crate::prompt::render_sql_prompt;
use crate::types::{GeneratedQuery, SchemaDescription};

/// First stage: conversation and schema in, one SQL statement out.
pub struct SqlQueryChain {
    client: Arc<dyn TextGenerator>,
    schema: Arc<dyn SchemaProvider>,
}

impl SqlQueryChain {
    pub fn new(client: Arc<dyn TextGenerator>, schema: Arc<dyn SchemaProvider>) -> Self {
        SqlQueryChain { client, schema }
    }

    /// The completion is returned exactly as generated. Generator failures and
    /// blank completions propagate instead of producing a statement to run.
    pub async fn generate_query(
        &self,
        question: &str,
        history: &ConversationHistory,
        schema: &SchemaDescription,
    ) -> Result<GeneratedQuery, ChainError> {
        let prompt = render_sql_prompt(schema, history, question);
        debug!(prompt_chars = prompt.len(), "requesting sql");

        let sql_query = require_text(self.client.complete(&prompt).await?)?;

        debug!(generated_sql = %sql_query, "sql generated (unverified)");

        Ok(GeneratedQuery::new(sql_query))
    }
}

#[async_trait]
impl Chain for SqlQueryChain {
    type Output = GeneratedQuery;

    async fn run(
        &self,
        input: &str,
        history: &ConversationHistory,
    ) -> Result<GeneratedQuery, ChainError> {
        let schema = self.schema.get_schema().await?;
        self.generate_query(input, history, &schema).await
    }
}

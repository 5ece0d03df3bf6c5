#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ai_db_sql_chat::database::{QueryExecutor, SchemaProvider};
use ai_db_sql_chat::error::{GenerationError, SchemaError};
use ai_db_sql_chat::llm::TextGenerator;
use ai_db_sql_chat::text_to_sql_chain::TextToSqlChain;
use ai_db_sql_chat::types::{ExecutionResult, GeneratedQuery, SchemaDescription};
use async_trait::async_trait;

pub const USERS_SCHEMA: &str = "CREATE TABLE users (\n\tid integer NOT NULL,\n\tactive integer\n)";

/// Replays canned completions in order and records every prompt it sees.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Result<String, GenerationError>>) -> Arc<Self> {
        Arc::new(ScriptedGenerator {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Request("script exhausted".to_string())))
    }
}

/// In-memory stand-in for a database handle.
pub struct StubDatabase {
    schema: Mutex<Result<String, String>>,
    result: ExecutionResult,
    executed: Mutex<Vec<String>>,
    schema_calls: AtomicUsize,
}

impl StubDatabase {
    pub fn new(schema: &str, result: ExecutionResult) -> Arc<Self> {
        Arc::new(StubDatabase {
            schema: Mutex::new(Ok(schema.to_string())),
            result,
            executed: Mutex::new(Vec::new()),
            schema_calls: AtomicUsize::new(0),
        })
    }

    pub fn returning_rows(rows: &str) -> Arc<Self> {
        Self::new(USERS_SCHEMA, ExecutionResult::Rows(rows.to_string()))
    }

    pub fn set_schema(&self, schema: &str) {
        *self.schema.lock().unwrap() = Ok(schema.to_string());
    }

    pub fn break_schema(&self, message: &str) {
        *self.schema.lock().unwrap() = Err(message.to_string());
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaProvider for StubDatabase {
    async fn get_schema(&self) -> Result<SchemaDescription, SchemaError> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.schema
            .lock()
            .unwrap()
            .clone()
            .map(SchemaDescription::new)
            .map_err(SchemaError::Query)
    }
}

#[async_trait]
impl QueryExecutor for StubDatabase {
    async fn run(&self, query: &GeneratedQuery) -> ExecutionResult {
        self.executed.lock().unwrap().push(query.as_str().to_string());
        self.result.clone()
    }
}

pub fn chain(generator: &Arc<ScriptedGenerator>, db: &Arc<StubDatabase>) -> TextToSqlChain {
    TextToSqlChain::new(generator.clone(), db.clone())
}

//! Chat with a relational database: questions become SQL, SQL results become
//! answers, and the conversation carries context between turns.

pub mod chain;
pub mod config;
pub mod database;
pub mod error;
pub mod history;
pub mod llm;
pub mod prompt;
pub mod session;
pub mod sql_query_chain;
pub mod telemetry;
pub mod text_to_sql_chain;
pub mod types;

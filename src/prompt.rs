//! Prompt templates for the two generation stages.
//!
//! Rendering is a pure function of its inputs: the same schema, history and
//! question always produce the same prompt text.

use crate::history::ConversationHistory;
use crate::types::{ExecutionResult, GeneratedQuery, SchemaDescription};

const ROLE_FRAMING: &str = "You are a data analyst at a company. You are interacting with a user \
who is asking you questions about the company's database.";

/// Worked question/SQL pairs shown to the model before the real question.
pub const FEW_SHOT_EXAMPLES: &[(&str, &str)] = &[
    ("how many users are there?", "select count(*) from users u"),
    (
        "how many orders were placed in the last 30 days?",
        "select count(*) from orders o where o.created_at >= current_date - interval '30 days'",
    ),
    (
        "what is the total amount of paid invoices per customer?",
        "select c.name, sum(i.amount) from invoices i join customers c on c.id = i.customer_id where i.status = 'paid' group by c.name",
    ),
];

/// Prompt asking for a single SQL statement that answers `question`.
pub fn render_sql_prompt(
    schema: &SchemaDescription,
    history: &ConversationHistory,
    question: &str,
) -> String {
    let examples = FEW_SHOT_EXAMPLES
        .iter()
        .map(|(example_question, example_sql)| {
            format!("Question: {}\nSQL Query: {}", example_question, example_sql)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{role}\n\
         Based on the table schema below, write a SQL query that would answer the user's question. \
         Take the conversation history into account.\n\n\
         <SCHEMA>{schema}</SCHEMA>\n\n\
         Conversation History:\n{history}\n\n\
         Write only the SQL query and nothing else. Do not wrap the SQL query in any other text, \
         not even backticks and semicolon at the end.\n\n\
         For example:\n{examples}\n\n\
         Your turn:\n\n\
         Question: {question}\n\
         SQL Query:",
        role = ROLE_FRAMING,
        schema = schema,
        history = history.render(),
        examples = examples,
        question = question,
    )
}

/// Prompt asking for a natural-language answer built from the executed query.
pub fn render_answer_prompt(
    schema: &SchemaDescription,
    history: &ConversationHistory,
    query: &GeneratedQuery,
    result: &ExecutionResult,
    question: &str,
) -> String {
    let failure_note = if result.is_failure() {
        "The query failed. Explain the failure to the user in plain language.\n"
    } else {
        ""
    };

    format!(
        "{role}\n\
         Based on the table schema below, question, sql query, and sql response, \
         write a natural language response.\n\
         {failure_note}\
         <SCHEMA>{schema}</SCHEMA>\n\n\
         Conversation History:\n{history}\n\
         SQL Query: <SQL>{query}</SQL>\n\
         User question: {question}\n\
         SQL Response: {result}",
        role = ROLE_FRAMING,
        failure_note = failure_note,
        schema = schema,
        history = history.render(),
        query = query,
        question = question,
        result = result,
    )
}

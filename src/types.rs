//! Values passed between the pipeline stages.

use std::fmt;

/// Text describing the tables and columns of the live database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescription(String);

impl SchemaDescription {
    pub fn new(text: impl Into<String>) -> Self {
        SchemaDescription(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A statement produced by the SQL generation stage, exactly as the
/// generator returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuery(String);

impl GeneratedQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        GeneratedQuery(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneratedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What came back from running a [`GeneratedQuery`].
///
/// Failures are data here, not errors: the answer stage narrates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Rows(String),
    Failed(String),
}

impl ExecutionResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failed(_))
    }

    pub fn as_text(&self) -> &str {
        match self {
            ExecutionResult::Rows(text) | ExecutionResult::Failed(text) => text,
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_query_is_verbatim() {
        let query = GeneratedQuery::new("  select 1  ");
        assert_eq!(query.as_str(), "  select 1  ");
    }

    #[test]
    fn test_execution_result_text() {
        let ok = ExecutionResult::Rows("[{ count: 42 }]".to_string());
        let failed = ExecutionResult::Failed("Error: relation \"x\" does not exist".to_string());

        assert!(!ok.is_failure());
        assert!(failed.is_failure());
        assert_eq!(ok.to_string(), "[{ count: 42 }]");
        assert!(failed.as_text().contains("does not exist"));
    }
}

use thiserror::Error;

/// The text generator could not produce a completion.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generator returned an empty completion")]
    Empty,
}

/// The database schema could not be introspected.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for SchemaError {
    fn from(err: sqlx::Error) -> Self {
        SchemaError::Query(err.to_string())
    }
}

/// A stage of the pipeline failed and the turn has to be abandoned.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors surfaced to whoever drives a [`crate::session::Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no database connection; connect before asking questions")]
    NotConnected,

    #[error("question is empty")]
    EmptyQuestion,

    #[error("turn failed: {0}")]
    Chain(#[from] ChainError),
}

impl SessionError {
    /// Text suitable for showing to the person at the prompt.
    ///
    /// Precondition failures are shown literally. Pipeline failures become a
    /// generic apology; the underlying cause is logged instead.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::NotConnected | SessionError::EmptyQuestion => self.to_string(),
            SessionError::Chain(ChainError::Generation(GenerationError::Empty)) => {
                "Sorry, the language model returned nothing. Please ask again.".to_string()
            }
            SessionError::Chain(ChainError::Generation(_)) => {
                "Sorry, I couldn't reach the language model. Please ask again.".to_string()
            }
            SessionError::Chain(ChainError::Schema(_)) => {
                "Sorry, I couldn't read the database schema. Please ask again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display() {
        let err = GenerationError::Request("rate limited".to_string());
        assert_eq!(err.to_string(), "generation request failed: rate limited");
    }

    #[test]
    fn test_chain_error_is_transparent() {
        let err: ChainError = SchemaError::Query("permission denied".to_string()).into();
        assert_eq!(err.to_string(), "schema query failed: permission denied");
    }

    #[test]
    fn test_user_message_hides_generation_details() {
        let err = SessionError::Chain(GenerationError::Request("401 unauthorized".to_string()).into());
        let message = err.user_message();
        assert!(message.starts_with("Sorry"));
        assert!(!message.contains("401"));
    }

    #[test]
    fn test_user_message_for_empty_completion() {
        let err = SessionError::Chain(GenerationError::Empty.into());
        assert!(err.user_message().contains("returned nothing"));
    }

    #[test]
    fn test_user_message_for_missing_connection() {
        let message = SessionError::NotConnected.user_message();
        assert!(message.contains("no database connection"));
    }
}

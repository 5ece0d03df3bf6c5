//! Conversation turns and the append-only history a session owns.

use std::fmt;

/// Greeting every session starts with.
pub const SEED_GREETING: &str = "Hello! I'm a SQL assistant. Ask me anything about your database.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "Human",
            Role::Assistant => "AI",
        }
    }
}

/// One message in the conversation. Fields are private so a turn cannot be
/// edited once it is part of a history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role.label(), self.text)
    }
}

/// Ordered turns, oldest first. Only appends are exposed.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding only the assistant greeting.
    pub fn seeded() -> Self {
        let mut history = Self::new();
        history.push_assistant(SEED_GREETING);
        history
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::assistant(text));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// One line per turn, prefixed with the speaker label.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(Turn::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_history_starts_with_greeting() {
        let history = ConversationHistory::seeded();
        assert_eq!(history.len(), 1);
        let first = &history.turns()[0];
        assert_eq!(first.role(), Role::Assistant);
        assert_eq!(first.text(), SEED_GREETING);
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut history = ConversationHistory::new();
        history.push_user("how many users?");
        history.push_assistant("There are 3 users.");
        history.push_user("and admins?");

        let roles: Vec<Role> = history.turns().iter().map(Turn::role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(history.last().map(Turn::text), Some("and admins?"));
    }

    #[test]
    fn test_render_labels_each_turn() {
        let mut history = ConversationHistory::seeded();
        history.push_user("list tables");

        let rendered = history.render();
        assert_eq!(
            rendered,
            format!("AI: {}\nHuman: list tables", SEED_GREETING)
        );
    }

    #[test]
    fn test_empty_history_renders_empty() {
        assert!(ConversationHistory::new().render().is_empty());
        assert!(ConversationHistory::new().is_empty());
    }
}

//! Conversation model
//!
//! A [`Conversation`] is an append-only sequence of [`Turn`]s shared by
//! every model in a round-table. It is owned and mutated exclusively by
//! the orchestrator; everything else gets read-only snapshots.

use crate::roundtable::role::DiscussionRole;
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Optional provenance attached to a turn.
///
/// Assistant turns in a round-table carry the producing model's name and,
/// when role-based prompting is active, the discussion role it played.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<DiscussionRole>,
}

impl TurnMeta {
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.role.is_none()
    }
}

/// A single message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "TurnMeta::is_empty")]
    pub meta: TurnMeta,
}

impl Turn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            meta: TurnMeta::default(),
        }
    }

    /// Create an assistant turn tagged with the producing model
    pub fn assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            meta: TurnMeta {
                model: Some(model.into()),
                role: None,
            },
        }
    }

    /// Create an assistant turn tagged with model and discussion role
    pub fn assistant_with_role(
        content: impl Into<String>,
        model: impl Into<String>,
        role: Option<DiscussionRole>,
    ) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            meta: TurnMeta {
                model: Some(model.into()),
                role,
            },
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == TurnRole::Assistant
    }

    /// The producing model's name, if tagged
    pub fn model(&self) -> Option<&str> {
        self.meta.model.as_deref()
    }
}

/// Append-only conversation history.
///
/// Turn order is chronological: it reflects round order, and within a
/// round the configured model order (never completion-arrival order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with a single user prompt
    pub fn seed(prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(prompt)],
        }
    }

    /// Append a turn. There is no removal; the history never shrinks.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// A read-only copy taken at round start, handed to concurrent
    /// model invocations so none of them observe mid-round mutation.
    pub fn snapshot(&self) -> Conversation {
        self.clone()
    }
}

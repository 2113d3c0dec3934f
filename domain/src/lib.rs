//! Domain layer for roundtable
//!
//! Core business logic with no I/O: the conversation model, model
//! specifications, provider tags, round-table settings, discussion
//! roles and the role resolver.

pub mod conversation;
pub mod core;
pub mod model;
pub mod roundtable;

// Re-export commonly used types
pub use conversation::{Conversation, Turn, TurnMeta, TurnRole};
pub use crate::core::error::DomainError;
pub use model::{ModelSpec, Provider};
pub use roundtable::result::{ModelResponse, ResponseOutcome, RoundResult};
pub use roundtable::role::{DiscussionRole, RoleResolver};
pub use roundtable::settings::RoundTableSettings;
pub use roundtable::template::RolePrompt;

//! Application layer for roundtable
//!
//! Use cases (the round-table orchestrator, single chat) and the ports
//! they depend on. Adapters for the ports live in the infrastructure
//! and presentation layers.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::completion::{
    CompletionClient, CompletionClientFactory, CompletionError, StreamEvent, StreamHandle,
};
pub use ports::presenter::{NullPresenter, RoundTablePresenter};
pub use use_cases::run_chat::{ChatError, RunChatUseCase};
pub use use_cases::run_roundtable::{RoundTableError, RunRoundTableUseCase};

//! Round-table concepts: settings, discussion roles, round results

pub mod result;
pub mod role;
pub mod settings;
pub mod template;

pub use result::{ModelResponse, ResponseOutcome, RoundResult};
pub use role::{DiscussionRole, RoleResolver};
pub use settings::RoundTableSettings;
pub use template::RolePrompt;

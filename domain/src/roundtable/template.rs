//! Prompt templates for discussion roles
//!
//! The rendered instruction is injected into the outgoing context for
//! one model in one round; it is never stored in the shared
//! conversation, so role prompts cannot leak between models or rounds.

use crate::roundtable::role::DiscussionRole;
use crate::roundtable::settings::RoundTableSettings;

/// Renders the instruction text for an active discussion role
pub struct RolePrompt;

impl RolePrompt {
    /// Template for `role`: the custom override when configured, else
    /// the built-in default. Substitution is purely textual; templates
    /// are never executed.
    pub fn render(role: DiscussionRole, settings: &RoundTableSettings) -> String {
        settings
            .custom_role_templates
            .get(&role)
            .cloned()
            .unwrap_or_else(|| Self::default_template(role).to_string())
    }

    fn default_template(role: DiscussionRole) -> &'static str {
        match role {
            DiscussionRole::Generator => {
                r#"You are playing the generator role in this discussion.
Propose concrete ideas, suggestions, or solutions to the topic at hand.
Be constructive and specific; favor substance over caveats."#
            }
            DiscussionRole::Critic => {
                r#"You are playing the critic role in this discussion.
Examine the previous responses for errors, gaps, and weak reasoning.
Be fair but direct: name what is wrong and why it matters."#
            }
            DiscussionRole::Refiner => {
                r#"You are playing the refiner role in this discussion.
Take the strongest ideas raised so far and improve them: tighten the
reasoning, fill in missing details, and resolve loose ends."#
            }
            DiscussionRole::Evaluator => {
                r#"You are playing the evaluator role in this discussion.
Weigh the contributions so far and summarize where the discussion
stands: points of agreement, open disputes, and the best answer yet."#
            }
        }
    }
}

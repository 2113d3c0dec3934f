//! Round-table settings

use crate::roundtable::role::DiscussionRole;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_rounds() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

/// Configuration for round-table discussions.
///
/// `enabled_models` is an ordered set: its order is the dispatch order
/// in sequential mode and the display/append order in every mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTableSettings {
    pub enabled_models: Vec<String>,
    pub discussion_rounds: usize,
    pub critique_mode: bool,
    pub parallel_responses: bool,
    pub timeout_seconds: u64,
    pub use_role_based_prompting: bool,
    pub role_rotation: bool,
    pub role_assignments: HashMap<String, Vec<DiscussionRole>>,
    pub custom_role_templates: HashMap<DiscussionRole, String>,
}

impl Default for RoundTableSettings {
    fn default() -> Self {
        Self {
            enabled_models: Vec::new(),
            discussion_rounds: default_rounds(),
            critique_mode: default_true(),
            parallel_responses: false,
            timeout_seconds: default_timeout(),
            use_role_based_prompting: false,
            role_rotation: false,
            role_assignments: HashMap::new(),
            custom_role_templates: HashMap::new(),
        }
    }
}

impl RoundTableSettings {
    /// Add a model to the round-table, keeping the order stable and the
    /// set free of duplicates.
    pub fn add_model(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.enabled_models.contains(&name) {
            self.enabled_models.push(name);
        }
    }

    pub fn remove_model(&mut self, name: &str) {
        self.enabled_models.retain(|m| m != name);
    }
}

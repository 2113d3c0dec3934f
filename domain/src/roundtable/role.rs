//! Discussion roles and the role resolver

use crate::core::error::DomainError;
use crate::roundtable::settings::RoundTableSettings;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Behavioral stance applied to a model's prompt for one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscussionRole {
    Generator,
    Critic,
    Refiner,
    Evaluator,
}

impl DiscussionRole {
    /// Canonical rotation order
    pub const ALL: [DiscussionRole; 4] = [
        DiscussionRole::Generator,
        DiscussionRole::Critic,
        DiscussionRole::Refiner,
        DiscussionRole::Evaluator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscussionRole::Generator => "generator",
            DiscussionRole::Critic => "critic",
            DiscussionRole::Refiner => "refiner",
            DiscussionRole::Evaluator => "evaluator",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiscussionRole::Generator => "Creates initial ideas, suggestions, or solutions",
            DiscussionRole::Critic => "Analyzes and critiques previous responses",
            DiscussionRole::Refiner => "Improves and builds upon existing ideas",
            DiscussionRole::Evaluator => "Evaluates final outcomes and provides summaries",
        }
    }
}

impl std::fmt::Display for DiscussionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DiscussionRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generator" => Ok(DiscussionRole::Generator),
            "critic" => Ok(DiscussionRole::Critic),
            "refiner" => Ok(DiscussionRole::Refiner),
            "evaluator" => Ok(DiscussionRole::Evaluator),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

impl Serialize for DiscussionRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DiscussionRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Resolves which discussion role a model plays in a given round.
///
/// Deterministic: the same (model, round, settings) always yields the
/// same role, so the set of roles for a round is fixed before any model
/// is invoked.
pub struct RoleResolver;

impl RoleResolver {
    /// Active role for `model` in round `round_index`, or `None` when
    /// role-based prompting is disabled.
    pub fn active_role_for(
        model: &str,
        round_index: usize,
        settings: &RoundTableSettings,
    ) -> Option<DiscussionRole> {
        if !settings.use_role_based_prompting {
            return None;
        }

        let assigned = settings
            .role_assignments
            .get(model)
            .filter(|roles| !roles.is_empty());

        match assigned {
            Some(roles) => {
                if settings.role_rotation {
                    Some(roles[round_index % roles.len()])
                } else {
                    // First assigned role is the primary
                    Some(roles[0])
                }
            }
            // Unassigned models are eligible for every role
            None => {
                if settings.role_rotation {
                    Some(DiscussionRole::ALL[round_index % DiscussionRole::ALL.len()])
                } else {
                    Some(DiscussionRole::Generator)
                }
            }
        }
    }
}

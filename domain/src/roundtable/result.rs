//! Per-round results

use crate::roundtable::role::DiscussionRole;
use serde::{Deserialize, Serialize};

/// How a model's slot in a round was filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOutcome {
    Ok,
    TimedOut,
    Failed,
}

/// One model's contribution to a round.
///
/// Exists exactly once per model per round: timeouts and provider
/// failures fill the slot with a marker text instead of leaving it
/// absent, so partial failure never shortens a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model: String,
    pub role: Option<DiscussionRole>,
    pub text: String,
    pub outcome: ResponseOutcome,
}

impl ModelResponse {
    pub fn success(
        model: impl Into<String>,
        role: Option<DiscussionRole>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            role,
            text: text.into(),
            outcome: ResponseOutcome::Ok,
        }
    }

    pub fn timed_out(model: impl Into<String>, role: Option<DiscussionRole>, secs: u64) -> Self {
        let model = model.into();
        let text = format!("{model} timed out after {secs}s");
        Self {
            model,
            role,
            text,
            outcome: ResponseOutcome::TimedOut,
        }
    }

    pub fn failed(
        model: impl Into<String>,
        role: Option<DiscussionRole>,
        error: impl std::fmt::Display,
    ) -> Self {
        let model = model.into();
        let text = format!("{model} error: {error}");
        Self {
            model,
            role,
            text,
            outcome: ResponseOutcome::Failed,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == ResponseOutcome::Ok
    }
}

/// All responses of one round, in configured model order.
///
/// Consumed to extend the conversation, then discarded; nothing here is
/// persisted beyond the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    round_index: usize,
    responses: Vec<ModelResponse>,
}

impl RoundResult {
    pub fn new(round_index: usize, responses: Vec<ModelResponse>) -> Self {
        Self {
            round_index,
            responses,
        }
    }

    pub fn round_index(&self) -> usize {
        self.round_index
    }

    pub fn responses(&self) -> &[ModelResponse] {
        &self.responses
    }

    pub fn get(&self, model: &str) -> Option<&ModelResponse> {
        self.responses.iter().find(|r| r.model == model)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

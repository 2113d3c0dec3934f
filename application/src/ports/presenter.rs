//! Presenter port
//!
//! One-way notification sink for rendering responses. The orchestrator
//! calls these as fire-and-forget; nothing a presenter does can feed a
//! decision back into orchestration.

use roundtable_domain::{DiscussionRole, RoundResult};

/// Notification sink for chat and round-table output.
///
/// Implementations live in the presentation layer. All methods default
/// to no-ops so presenters only override what they render.
pub trait RoundTablePresenter: Send + Sync {
    /// A round is starting
    fn on_round_start(&self, _round_index: usize, _total_rounds: usize) {}

    /// A model is about to be invoked (sequential mode)
    fn on_model_start(&self, _model: &str, _role: Option<DiscussionRole>) {}

    /// A streamed text chunk arrived (single chat)
    fn on_model_chunk(&self, _model: &str, _chunk: &str) {}

    /// A model's response (or its error marker) is final.
    ///
    /// Called in configured model order in every mode, so rendering is
    /// deterministic regardless of completion-arrival order.
    fn on_model_response(&self, _model: &str, _role: Option<DiscussionRole>, _text: &str) {}

    /// All of a round's slots are filled
    fn on_round_result(&self, _round_index: usize, _result: &RoundResult) {}
}

/// No-op presenter for tests and quiet mode
pub struct NullPresenter;

impl RoundTablePresenter for NullPresenter {}

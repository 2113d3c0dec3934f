//! Run round-table use case
//!
//! Drives N discussion rounds across M models sharing one conversation.
//! This is the only component that mutates the conversation; everything
//! it hands out (snapshots, results) is read-only.

use crate::ports::completion::{CompletionClient, CompletionClientFactory, CompletionError};
use crate::ports::presenter::RoundTablePresenter;
use roundtable_domain::{
    Conversation, DiscussionRole, ModelResponse, ModelSpec, RolePrompt, RoleResolver, RoundResult,
    RoundTableSettings, Turn,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that abort a round-table before any round runs.
///
/// Per-model timeouts and provider failures are deliberately absent:
/// those are absorbed into marker responses and never escalate.
#[derive(Error, Debug)]
pub enum RoundTableError {
    #[error("round-table needs at least 2 enabled models (got {0})")]
    InsufficientModels(usize),

    #[error("invalid round-table settings: {0}")]
    InvalidSettings(String),

    #[error("model '{0}' is enabled for the round-table but has no configuration")]
    UnknownModel(String),
}

/// Use case for running a round-table discussion
pub struct RunRoundTableUseCase<F: CompletionClientFactory + 'static> {
    factory: Arc<F>,
}

impl<F: CompletionClientFactory + 'static> RunRoundTableUseCase<F> {
    pub fn new(factory: Arc<F>) -> Self {
        Self { factory }
    }

    /// Run the full discussion and return the final conversation.
    ///
    /// Fails only on structural preconditions, with zero side effects:
    /// no provider is called and no notification is sent before the
    /// settings have been validated.
    pub async fn run(
        &self,
        prompt: &str,
        settings: &RoundTableSettings,
        specs: &HashMap<String, ModelSpec>,
        presenter: &dyn RoundTablePresenter,
    ) -> Result<Conversation, RoundTableError> {
        let participants = Self::validate(settings, specs)?;

        info!(
            models = participants.len(),
            rounds = settings.discussion_rounds,
            parallel = settings.parallel_responses,
            "starting round-table"
        );

        let mut conversation = Conversation::seed(prompt);

        for round in 0..settings.discussion_rounds {
            presenter.on_round_start(round, settings.discussion_rounds);

            // Participants and roles are fixed before any invocation starts
            let roles: Vec<Option<DiscussionRole>> = participants
                .iter()
                .map(|spec| RoleResolver::active_role_for(&spec.name, round, settings))
                .collect();

            let snapshot = conversation.snapshot();

            let result = if settings.parallel_responses {
                self.run_parallel_round(round, &snapshot, &participants, &roles, settings, presenter)
                    .await
            } else {
                self.run_sequential_round(
                    round,
                    &snapshot,
                    &participants,
                    &roles,
                    settings,
                    presenter,
                )
                .await
            };

            // Extend the shared conversation in configured model order,
            // markers included, so the narrative survives partial failure.
            for response in result.responses() {
                conversation.push(Turn::assistant_with_role(
                    response.text.clone(),
                    response.model.clone(),
                    response.role,
                ));
            }

            presenter.on_round_result(round, &result);
            debug!(round, turns = conversation.len(), "round complete");
        }

        Ok(conversation)
    }

    fn validate(
        settings: &RoundTableSettings,
        specs: &HashMap<String, ModelSpec>,
    ) -> Result<Vec<ModelSpec>, RoundTableError> {
        if settings.enabled_models.len() < 2 {
            return Err(RoundTableError::InsufficientModels(
                settings.enabled_models.len(),
            ));
        }
        if settings.discussion_rounds < 1 {
            return Err(RoundTableError::InvalidSettings(
                "discussion_rounds must be at least 1".to_string(),
            ));
        }
        if settings.timeout_seconds == 0 {
            return Err(RoundTableError::InvalidSettings(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        settings
            .enabled_models
            .iter()
            .map(|name| {
                specs
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RoundTableError::UnknownModel(name.clone()))
            })
            .collect()
    }

    /// One round with all models invoked concurrently.
    ///
    /// Every task gets the identical round-start snapshot; results land
    /// in position-indexed slots so the outcome order is the configured
    /// model order, never completion order. The join waits for all
    /// tasks: one slow model cannot starve the others of their slots.
    async fn run_parallel_round(
        &self,
        round: usize,
        snapshot: &Conversation,
        participants: &[ModelSpec],
        roles: &[Option<DiscussionRole>],
        settings: &RoundTableSettings,
        presenter: &dyn RoundTablePresenter,
    ) -> RoundResult {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        let mut join_set = JoinSet::new();

        for (idx, spec) in participants.iter().enumerate() {
            let client = self.factory.client_for(spec.provider);
            let spec = spec.clone();
            let role = roles[idx];
            let context = Self::outgoing_turns(snapshot, &[], role, settings);

            join_set.spawn(async move {
                let outcome =
                    tokio::time::timeout(timeout, Self::complete(client, &spec, &context)).await;
                (idx, outcome)
            });
        }

        let mut slots: Vec<Option<ModelResponse>> = vec![None; participants.len()];

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, outcome)) => {
                    let spec = &participants[idx];
                    slots[idx] = Some(Self::settle(spec, roles[idx], outcome, settings));
                }
                Err(e) => {
                    // Task panicked or was cancelled; the slot sweep
                    // below fills in a marker for it.
                    warn!("round-table task join error: {e}");
                }
            }
        }

        let responses: Vec<ModelResponse> = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    ModelResponse::failed(
                        participants[idx].name.clone(),
                        roles[idx],
                        "task aborted",
                    )
                })
            })
            .collect();

        for response in &responses {
            presenter.on_model_response(&response.model, response.role, &response.text);
        }

        RoundResult::new(round, responses)
    }

    /// One round with models invoked in configured order.
    ///
    /// In critique mode, each model after the first sees the round-start
    /// snapshot plus every response already produced in *this* round;
    /// earlier rounds only reach it through the accumulated
    /// conversation. With critique off, every model sees only the
    /// snapshot regardless of position.
    async fn run_sequential_round(
        &self,
        round: usize,
        snapshot: &Conversation,
        participants: &[ModelSpec],
        roles: &[Option<DiscussionRole>],
        settings: &RoundTableSettings,
        presenter: &dyn RoundTablePresenter,
    ) -> RoundResult {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        let mut responses: Vec<ModelResponse> = Vec::with_capacity(participants.len());

        for (idx, spec) in participants.iter().enumerate() {
            let role = roles[idx];
            let earlier: &[ModelResponse] = if settings.critique_mode && idx > 0 {
                &responses
            } else {
                &[]
            };
            let context = Self::outgoing_turns(snapshot, earlier, role, settings);

            presenter.on_model_start(&spec.name, role);

            let client = self.factory.client_for(spec.provider);
            let outcome =
                tokio::time::timeout(timeout, Self::complete(client, spec, &context)).await;

            let response = Self::settle(spec, role, outcome, settings);
            presenter.on_model_response(&response.model, response.role, &response.text);
            responses.push(response);
        }

        RoundResult::new(round, responses)
    }

    /// Build the turns one model actually receives: an optional leading
    /// role instruction, the shared snapshot, and (critique mode) the
    /// same-round responses produced so far, each tagged with its model.
    fn outgoing_turns(
        snapshot: &Conversation,
        earlier: &[ModelResponse],
        role: Option<DiscussionRole>,
        settings: &RoundTableSettings,
    ) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(snapshot.len() + earlier.len() + 1);

        if let Some(role) = role {
            turns.push(Turn::user(RolePrompt::render(role, settings)));
        }

        turns.extend_from_slice(snapshot.turns());

        for response in earlier {
            turns.push(Turn::assistant_with_role(
                response.text.clone(),
                response.model.clone(),
                response.role,
            ));
        }

        turns
    }

    /// Convert a (possibly timed-out) completion outcome into the
    /// model's round slot. Failures become markers here and nowhere
    /// else; nothing in this path can abort the round.
    fn settle(
        spec: &ModelSpec,
        role: Option<DiscussionRole>,
        outcome: Result<Result<String, CompletionError>, tokio::time::error::Elapsed>,
        settings: &RoundTableSettings,
    ) -> ModelResponse {
        match outcome {
            Ok(Ok(text)) => ModelResponse::success(spec.name.clone(), role, text),
            Ok(Err(e)) => {
                warn!(model = %spec.name, "provider call failed: {e}");
                ModelResponse::failed(spec.name.clone(), role, e)
            }
            Err(_) => {
                warn!(
                    model = %spec.name,
                    timeout = settings.timeout_seconds,
                    "provider call timed out"
                );
                ModelResponse::timed_out(spec.name.clone(), role, settings.timeout_seconds)
            }
        }
    }

    async fn complete(
        client: Arc<dyn CompletionClient>,
        spec: &ModelSpec,
        turns: &[Turn],
    ) -> Result<String, CompletionError> {
        let handle = client.stream_complete(spec, turns).await?;
        let text = handle.collect_text().await?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::completion::{StreamEvent, StreamHandle};
    use crate::ports::presenter::NullPresenter;
    use async_trait::async_trait;
    use roundtable_domain::Provider;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Scripted completion client: deterministic replies, optional
    /// per-model latency and failure, and a log of every context it was
    /// handed.
    struct StubClient {
        delays: HashMap<String, Duration>,
        failures: HashSet<String>,
        calls: Mutex<Vec<(String, Vec<Turn>)>>,
    }

    impl StubClient {
        fn new() -> Self {
            Self {
                delays: HashMap::new(),
                failures: HashSet::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(mut self, model: &str, delay: Duration) -> Self {
            self.delays.insert(model.to_string(), delay);
            self
        }

        fn with_failure(mut self, model: &str) -> Self {
            self.failures.insert(model.to_string());
            self
        }

        fn calls_for(&self, model: &str) -> Vec<Vec<Turn>> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(m, _)| m == model)
                .map(|(_, turns)| turns.clone())
                .collect()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn reply_for(spec: &ModelSpec, turns: &[Turn]) -> String {
            format!("{} answer after {} turns", spec.name, turns.len())
        }
    }

    #[async_trait]
    impl CompletionClient for StubClient {
        async fn stream_complete(
            &self,
            spec: &ModelSpec,
            turns: &[Turn],
        ) -> Result<StreamHandle, CompletionError> {
            self.calls
                .lock()
                .unwrap()
                .push((spec.name.clone(), turns.to_vec()));

            if self.failures.contains(&spec.name) {
                return Err(CompletionError::RequestFailed {
                    status: 500,
                    message: "boom".to_string(),
                });
            }

            let delay = self.delays.get(&spec.name).copied().unwrap_or_default();
            let reply = Self::reply_for(spec, turns);
            let (tx, rx) = mpsc::channel(4);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(StreamEvent::Delta(reply.clone())).await;
                let _ = tx.send(StreamEvent::Completed(reply)).await;
            });
            Ok(StreamHandle::new(rx))
        }
    }

    struct StubFactory(Arc<StubClient>);

    impl CompletionClientFactory for StubFactory {
        fn client_for(&self, _provider: Provider) -> Arc<dyn CompletionClient> {
            self.0.clone()
        }
    }

    fn spec(name: &str) -> ModelSpec {
        ModelSpec::new(name, Provider::OpenAi, name.split('/').next_back().unwrap())
    }

    fn specs(names: &[&str]) -> HashMap<String, ModelSpec> {
        names.iter().map(|n| (n.to_string(), spec(n))).collect()
    }

    fn settings(names: &[&str]) -> RoundTableSettings {
        let mut settings = RoundTableSettings::default();
        settings.enabled_models = names.iter().map(|s| s.to_string()).collect();
        settings
    }

    fn use_case(client: Arc<StubClient>) -> RunRoundTableUseCase<StubFactory> {
        RunRoundTableUseCase::new(Arc::new(StubFactory(client)))
    }

    #[tokio::test]
    async fn test_insufficient_models_fails_with_zero_side_effects() {
        let client = Arc::new(StubClient::new());
        let uc = use_case(client.clone());
        let result = uc
            .run(
                "topic",
                &settings(&["only/one"]),
                &specs(&["only/one"]),
                &NullPresenter,
            )
            .await;

        assert!(matches!(
            result,
            Err(RoundTableError::InsufficientModels(1))
        ));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_model_rejected_before_any_round() {
        let client = Arc::new(StubClient::new());
        let uc = use_case(client.clone());
        let result = uc
            .run(
                "topic",
                &settings(&["a", "missing"]),
                &specs(&["a"]),
                &NullPresenter,
            )
            .await;

        assert!(matches!(result, Err(RoundTableError::UnknownModel(m)) if m == "missing"));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_conversation_length_is_seed_plus_rounds_times_models() {
        let client = Arc::new(StubClient::new());
        let uc = use_case(client.clone());
        let mut s = settings(&["a", "b", "c"]);
        s.discussion_rounds = 3;

        let conversation = uc
            .run("topic", &s, &specs(&["a", "b", "c"]), &NullPresenter)
            .await
            .unwrap();

        assert_eq!(conversation.len(), 1 + 3 * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_turn_order_is_configured_order_not_arrival_order() {
        // "a" is much slower than "b"; the conversation must still list
        // a's turn first in every round.
        let client = Arc::new(
            StubClient::new()
                .with_delay("a", Duration::from_millis(800))
                .with_delay("b", Duration::from_millis(10)),
        );
        let uc = use_case(client.clone());
        let mut s = settings(&["a", "b"]);
        s.parallel_responses = true;
        s.discussion_rounds = 2;

        let conversation = uc
            .run("topic", &s, &specs(&["a", "b"]), &NullPresenter)
            .await
            .unwrap();

        let models: Vec<_> = conversation
            .turns()
            .iter()
            .filter_map(|t| t.model())
            .collect();
        assert_eq!(models, vec!["a", "b", "a", "b"]);
    }

    #[tokio::test]
    async fn test_parallel_models_share_identical_snapshot() {
        let client = Arc::new(StubClient::new());
        let uc = use_case(client.clone());
        let mut s = settings(&["a", "b"]);
        s.parallel_responses = true;
        s.critique_mode = true; // must be ignored in parallel mode
        s.discussion_rounds = 1;

        uc.run("topic", &s, &specs(&["a", "b"]), &NullPresenter)
            .await
            .unwrap();

        let a_context = &client.calls_for("a")[0];
        let b_context = &client.calls_for("b")[0];
        assert_eq!(a_context, b_context);
        assert_eq!(a_context.len(), 1);
    }

    #[tokio::test]
    async fn test_critique_mode_threads_same_round_responses() {
        let client = Arc::new(StubClient::new());
        let uc = use_case(client.clone());
        let mut s = settings(&["a", "b", "c"]);
        s.critique_mode = true;
        s.discussion_rounds = 1;

        uc.run("topic", &s, &specs(&["a", "b", "c"]), &NullPresenter)
            .await
            .unwrap();

        // Third model sees the snapshot plus a's and b's fresh replies
        let c_context = &client.calls_for("c")[0];
        assert_eq!(c_context.len(), 3);
        assert_eq!(c_context[1].model(), Some("a"));
        assert_eq!(c_context[2].model(), Some("b"));
        assert!(c_context[1].content.starts_with("a answer"));
    }

    #[tokio::test]
    async fn test_critique_disabled_hides_same_round_responses() {
        let client = Arc::new(StubClient::new());
        let uc = use_case(client.clone());
        let mut s = settings(&["a", "b", "c"]);
        s.critique_mode = false;
        s.discussion_rounds = 1;

        uc.run("topic", &s, &specs(&["a", "b", "c"]), &NullPresenter)
            .await
            .unwrap();

        let c_context = &client.calls_for("c")[0];
        assert_eq!(c_context.len(), 1);
        assert!(c_context[0].is_user());
    }

    #[tokio::test]
    async fn test_prior_rounds_arrive_through_the_conversation_only() {
        let client = Arc::new(StubClient::new());
        let uc = use_case(client.clone());
        let mut s = settings(&["a", "b"]);
        s.critique_mode = true;
        s.discussion_rounds = 2;

        uc.run("topic", &s, &specs(&["a", "b"]), &NullPresenter)
            .await
            .unwrap();

        // Round 1: a sees seed + both round-0 replies (via the grown
        // conversation), not duplicated by critique context.
        let a_round1 = &client.calls_for("a")[1];
        assert_eq!(a_round1.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fills_marker_and_round_stays_full_length() {
        let client = Arc::new(StubClient::new().with_delay("b", Duration::from_secs(120)));
        let uc = use_case(client.clone());
        let mut s = settings(&["a", "b", "c"]);
        s.parallel_responses = true;
        s.timeout_seconds = 5;
        s.discussion_rounds = 1;

        let conversation = uc
            .run("topic", &s, &specs(&["a", "b", "c"]), &NullPresenter)
            .await
            .unwrap();

        assert_eq!(conversation.len(), 4);
        let b_turn = conversation
            .turns()
            .iter()
            .find(|t| t.model() == Some("b"))
            .unwrap();
        assert_eq!(b_turn.content, "b timed out after 5s");
        let a_turn = conversation
            .turns()
            .iter()
            .find(|t| t.model() == Some("a"))
            .unwrap();
        assert!(a_turn.content.starts_with("a answer"));
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_marker_not_error() {
        let client = Arc::new(StubClient::new().with_failure("b"));
        let uc = use_case(client.clone());
        let mut s = settings(&["a", "b"]);
        s.discussion_rounds = 1;

        let conversation = uc
            .run("topic", &s, &specs(&["a", "b"]), &NullPresenter)
            .await
            .unwrap();

        let b_turn = conversation
            .turns()
            .iter()
            .find(|t| t.model() == Some("b"))
            .unwrap();
        assert!(b_turn.content.starts_with("b error:"));
        assert!(b_turn.content.contains("500"));
    }

    #[tokio::test]
    async fn test_role_rotation_tags_alternating_roles() {
        let client = Arc::new(StubClient::new());
        let uc = use_case(client.clone());
        let mut s = settings(&["a", "b"]);
        s.discussion_rounds = 4;
        s.use_role_based_prompting = true;
        s.role_rotation = true;
        s.role_assignments.insert(
            "a".to_string(),
            vec![DiscussionRole::Generator, DiscussionRole::Critic],
        );

        let conversation = uc
            .run("topic", &s, &specs(&["a", "b"]), &NullPresenter)
            .await
            .unwrap();

        let a_roles: Vec<_> = conversation
            .turns()
            .iter()
            .filter(|t| t.model() == Some("a"))
            .map(|t| t.meta.role.unwrap())
            .collect();
        assert_eq!(
            a_roles,
            vec![
                DiscussionRole::Generator,
                DiscussionRole::Critic,
                DiscussionRole::Generator,
                DiscussionRole::Critic,
            ]
        );

        // The role instruction leads each outgoing context but is never
        // stored in the shared conversation.
        let a_round0 = &client.calls_for("a")[0];
        assert!(a_round0[0].content.contains("generator"));
        assert!(
            conversation
                .turns()
                .iter()
                .all(|t| !t.content.contains("You are playing"))
        );
    }

    #[tokio::test]
    async fn test_deterministic_given_fixed_stub_and_settings() {
        let mut s = settings(&["a", "b"]);
        s.discussion_rounds = 2;

        let first = use_case(Arc::new(StubClient::new()))
            .run("topic", &s, &specs(&["a", "b"]), &NullPresenter)
            .await
            .unwrap();
        let second = use_case(Arc::new(StubClient::new()))
            .run("topic", &s, &specs(&["a", "b"]), &NullPresenter)
            .await
            .unwrap();

        assert_eq!(first, second);
    }
}

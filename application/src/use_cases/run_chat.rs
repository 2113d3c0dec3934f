//! Run chat use case
//!
//! Single-model streaming chat: one prompt in, chunks forwarded to the
//! presenter as they arrive, full reply appended to the conversation.

use crate::ports::completion::{CompletionClientFactory, CompletionError, StreamEvent};
use crate::ports::presenter::RoundTablePresenter;
use roundtable_domain::{Conversation, ModelSpec, Turn};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Use case for a plain one-model chat exchange
pub struct RunChatUseCase<F: CompletionClientFactory + 'static> {
    factory: Arc<F>,
}

impl<F: CompletionClientFactory + 'static> RunChatUseCase<F> {
    pub fn new(factory: Arc<F>) -> Self {
        Self { factory }
    }

    /// Send `prompt` against the running conversation and append both
    /// the prompt and the model's reply to it.
    ///
    /// The conversation is only touched on success; a failed exchange
    /// must not leave an unanswered user turn that every later
    /// exchange would re-send.
    pub async fn run(
        &self,
        prompt: &str,
        spec: &ModelSpec,
        conversation: &mut Conversation,
        presenter: &dyn RoundTablePresenter,
    ) -> Result<String, ChatError> {
        let mut outgoing = conversation.turns().to_vec();
        outgoing.push(Turn::user(prompt));

        let client = self.factory.client_for(spec.provider);
        let mut handle = client.stream_complete(spec, &outgoing).await?;

        let mut full_text = String::new();
        while let Some(event) = handle.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => {
                    presenter.on_model_chunk(&spec.name, &chunk);
                    full_text.push_str(&chunk);
                }
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        full_text = text;
                    }
                    break;
                }
                StreamEvent::Error(e) => {
                    return Err(CompletionError::Other(e).into());
                }
            }
        }

        let reply = full_text.trim().to_string();
        debug!(model = %spec.name, chars = reply.len(), "chat reply complete");
        conversation.push(Turn::user(prompt));
        conversation.push(Turn::assistant(reply.clone(), spec.name.clone()));
        Ok(reply)
    }
}

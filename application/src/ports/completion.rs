//! Completion client port
//!
//! Defines how the use cases talk to LLM providers. Implementations
//! (one adapter per provider) live in the infrastructure layer.

use async_trait::async_trait;
use roundtable_domain::{ModelSpec, Provider, Turn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from a completion client
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("no API key available for {0} (set the key or an env: reference in the model config)")]
    MissingApiKey(String),

    #[error("other error: {0}")]
    Other(String),
}

/// An event in a streaming completion
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A text chunk from the model
    Delta(String),
    /// The complete response text (signals stream end)
    Completed(String),
    /// An error that occurred mid-stream
    Error(String),
}

/// Handle for receiving a streaming completion.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. The stream is finite and not
/// restartable; dropping the handle abandons the in-flight call.
#[derive(Debug)]
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and concatenate all text into the final
    /// response string.
    pub async fn collect_text(mut self) -> Result<String, CompletionError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(CompletionError::Other(e));
                }
            }
        }
        // Channel closed without Completed; return what we have
        Ok(full_text)
    }
}

/// Client for one provider's completion API
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Start a streaming completion for `spec` against the given turns.
    ///
    /// The turns are a read-only view; the client must not assume it
    /// can be called again with the same stream.
    async fn stream_complete(
        &self,
        spec: &ModelSpec,
        turns: &[Turn],
    ) -> Result<StreamHandle, CompletionError>;
}

/// Factory resolving a provider tag into its client.
///
/// The provider set is a closed enum, so this is a total function; no
/// plugin registry is involved.
pub trait CompletionClientFactory: Send + Sync {
    fn client_for(&self, provider: Provider) -> Arc<dyn CompletionClient>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_text_concatenates_deltas() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(StreamEvent::Delta("Hello".into())).await.unwrap();
        tx.send(StreamEvent::Delta(", world".into())).await.unwrap();
        tx.send(StreamEvent::Completed("Hello, world".into()))
            .await
            .unwrap();
        drop(tx);

        let text = StreamHandle::new(rx).collect_text().await.unwrap();
        assert_eq!(text, "Hello, world");
    }

    #[tokio::test]
    async fn test_collect_text_uses_completed_when_no_deltas() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(StreamEvent::Completed("whole response".into()))
            .await
            .unwrap();
        drop(tx);

        let text = StreamHandle::new(rx).collect_text().await.unwrap();
        assert_eq!(text, "whole response");
    }

    #[tokio::test]
    async fn test_collect_text_surfaces_stream_error() {
        let (tx, rx) = mpsc::channel(2);
        tx.send(StreamEvent::Delta("partial".into())).await.unwrap();
        tx.send(StreamEvent::Error("rate limited".into()))
            .await
            .unwrap();
        drop(tx);

        let err = StreamHandle::new(rx).collect_text().await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }
}

//! Anthropic messages adapter (SSE streaming)

use super::{LineBuffer, check_status, connection_error, sse_data};
use async_trait::async_trait;
use futures::StreamExt;
use roundtable_application::{CompletionClient, CompletionError, StreamEvent, StreamHandle};
use roundtable_domain::{ModelSpec, Turn, TurnRole};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// The messages API requires strictly alternating roles starting
    /// with "user", so consecutive same-role turns (common in a
    /// round-table, where several assistant replies land back to back)
    /// are merged into one message.
    fn merge_turns(turns: &[Turn]) -> Vec<Value> {
        let mut messages: Vec<(&'static str, String)> = Vec::new();

        for turn in turns {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "assistant",
            };
            match messages.last_mut() {
                Some((last_role, content)) if *last_role == role => {
                    content.push_str("\n\n");
                    content.push_str(&turn.content);
                }
                _ => messages.push((role, turn.content.clone())),
            }
        }

        if messages.first().is_none_or(|(role, _)| *role != "user") {
            messages.insert(0, ("user", "Continue the discussion.".to_string()));
        }

        messages
            .into_iter()
            .map(|(role, content)| json!({"role": role, "content": content}))
            .collect()
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn stream_complete(
        &self,
        spec: &ModelSpec,
        turns: &[Turn],
    ) -> Result<StreamHandle, CompletionError> {
        let api_key = spec
            .api_key
            .as_deref()
            .and_then(crate::config::resolve_api_key)
            .ok_or_else(|| CompletionError::MissingApiKey(spec.name.clone()))?;

        let url = format!("{}/v1/messages", spec.endpoint_or_default());
        let body = json!({
            "model": spec.model,
            "messages": Self::merge_turns(turns),
            "temperature": spec.temperature,
            "max_tokens": spec.max_tokens,
            "stream": true,
        });

        debug!(model = %spec.name, url, "anthropic request");
        let response = self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        let response = check_status(response).await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = LineBuffer::new();
            let mut full_text = String::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                for line in buffer.push(&chunk) {
                    let Some(data) = sse_data(&line) else { continue };
                    let Ok(value) = serde_json::from_str::<Value>(data) else {
                        continue;
                    };
                    match value["type"].as_str() {
                        Some("content_block_delta") => {
                            if let Some(text) = value["delta"]["text"].as_str() {
                                full_text.push_str(text);
                                let _ = tx.send(StreamEvent::Delta(text.to_string())).await;
                            }
                        }
                        Some("message_stop") => {
                            let _ = tx.send(StreamEvent::Completed(full_text)).await;
                            return;
                        }
                        Some("error") => {
                            let message = value["error"]["message"]
                                .as_str()
                                .unwrap_or("unknown stream error")
                                .to_string();
                            let _ = tx.send(StreamEvent::Error(message)).await;
                            return;
                        }
                        _ => {}
                    }
                }
            }
            let _ = tx.send(StreamEvent::Completed(full_text)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

//! OpenAI chat completions adapter (SSE streaming)

use super::{LineBuffer, check_status, connection_error, sse_data, to_wire_messages};
use async_trait::async_trait;
use futures::StreamExt;
use roundtable_application::{CompletionClient, CompletionError, StreamEvent, StreamHandle};
use roundtable_domain::{ModelSpec, Turn};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

pub struct OpenAiClient {
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
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

        let url = format!("{}/v1/chat/completions", spec.endpoint_or_default());
        let body = json!({
            "model": spec.model,
            "messages": to_wire_messages(turns),
            "temperature": spec.temperature,
            "max_tokens": spec.max_tokens,
            "stream": true,
        });

        debug!(model = %spec.name, url, "openai request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
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
                    if data == "[DONE]" {
                        let _ = tx.send(StreamEvent::Completed(full_text)).await;
                        return;
                    }
                    let Ok(value) = serde_json::from_str::<Value>(data) else {
                        continue;
                    };
                    if let Some(delta) = value["choices"][0]["delta"]["content"].as_str() {
                        full_text.push_str(delta);
                        let _ = tx.send(StreamEvent::Delta(delta.to_string())).await;
                    }
                }
            }
            // Stream ended without [DONE]; deliver what arrived
            let _ = tx.send(StreamEvent::Completed(full_text)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

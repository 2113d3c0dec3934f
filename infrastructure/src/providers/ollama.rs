//! Ollama chat adapter (NDJSON streaming)
//!
//! Ollama runs locally and streams newline-delimited JSON instead of
//! SSE; no API key is involved.

use super::{LineBuffer, check_status, connection_error, to_wire_messages};
use async_trait::async_trait;
use futures::StreamExt;
use roundtable_application::{CompletionClient, CompletionError, StreamEvent, StreamHandle};
use roundtable_domain::{ModelSpec, Turn};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

pub struct OllamaClient {
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn stream_complete(
        &self,
        spec: &ModelSpec,
        turns: &[Turn],
    ) -> Result<StreamHandle, CompletionError> {
        let url = format!("{}/api/chat", spec.endpoint_or_default());
        let body = json!({
            "model": spec.model,
            "messages": to_wire_messages(turns),
            "stream": true,
            "options": {
                "temperature": spec.temperature,
                "num_predict": spec.max_tokens,
                "num_ctx": spec.context_window,
            },
        });

        debug!(model = %spec.name, url, "ollama request");
        let response = self
            .http
            .post(&url)
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
                    if line.is_empty() {
                        continue;
                    }
                    let Ok(value) = serde_json::from_str::<Value>(&line) else {
                        continue;
                    };
                    if let Some(error) = value["error"].as_str() {
                        let _ = tx.send(StreamEvent::Error(error.to_string())).await;
                        return;
                    }
                    if let Some(content) = value["message"]["content"].as_str() {
                        if !content.is_empty() {
                            full_text.push_str(content);
                            let _ = tx.send(StreamEvent::Delta(content.to_string())).await;
                        }
                    }
                    if value["done"].as_bool() == Some(true) {
                        let _ = tx.send(StreamEvent::Completed(full_text)).await;
                        return;
                    }
                }
            }
            let _ = tx.send(StreamEvent::Completed(full_text)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

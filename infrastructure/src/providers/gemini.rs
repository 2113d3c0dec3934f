//! Gemini generateContent adapter (SSE streaming)

use super::{LineBuffer, check_status, connection_error, sse_data};
use async_trait::async_trait;
use futures::StreamExt;
use roundtable_application::{CompletionClient, CompletionError, StreamEvent, StreamHandle};
use roundtable_domain::{ModelSpec, Turn, TurnRole};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

pub struct GeminiClient {
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Gemini uses "model" instead of "assistant" and nests text under
    /// parts. Consecutive same-role turns are merged to keep the
    /// contents alternating.
    fn to_contents(turns: &[Turn]) -> Vec<Value> {
        let mut contents: Vec<(&'static str, String)> = Vec::new();

        for turn in turns {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "model",
            };
            match contents.last_mut() {
                Some((last_role, text)) if *last_role == role => {
                    text.push_str("\n\n");
                    text.push_str(&turn.content);
                }
                _ => contents.push((role, turn.content.clone())),
            }
        }

        contents
            .into_iter()
            .map(|(role, text)| json!({"role": role, "parts": [{"text": text}]}))
            .collect()
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
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

        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            spec.endpoint_or_default(),
            spec.model
        );
        let body = json!({
            "contents": Self::to_contents(turns),
            "generationConfig": {
                "temperature": spec.temperature,
                "maxOutputTokens": spec.max_tokens,
            },
        });

        debug!(model = %spec.name, "gemini request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
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
                    if let Some(text) =
                        value["candidates"][0]["content"]["parts"][0]["text"].as_str()
                    {
                        full_text.push_str(text);
                        let _ = tx.send(StreamEvent::Delta(text.to_string())).await;
                    }
                }
            }
            // Gemini's SSE stream has no explicit done record; the body
            // closing is the end of the response.
            let _ = tx.send(StreamEvent::Completed(full_text)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_use_model_role_and_merge() {
        let turns = vec![
            Turn::user("topic"),
            Turn::assistant("one", "a"),
            Turn::assistant("two", "b"),
        ];
        let contents = GeminiClient::to_contents(&turns);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "one\n\ntwo");
    }
}

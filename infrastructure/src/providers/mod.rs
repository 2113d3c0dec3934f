//! Provider adapters
//!
//! One streaming HTTP client per provider, all sharing a single
//! `reqwest::Client` connection pool. The factory resolves the closed
//! provider tag into its adapter.

mod anthropic;
mod gemini;
mod ollama;
mod openai;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use roundtable_application::{CompletionClient, CompletionClientFactory, CompletionError};
use roundtable_domain::{Provider, Turn, TurnRole};
use std::sync::Arc;

/// Factory handing out the adapter for each provider tag
pub struct ProviderFactory {
    openai: Arc<OpenAiClient>,
    anthropic: Arc<AnthropicClient>,
    ollama: Arc<OllamaClient>,
    gemini: Arc<GeminiClient>,
}

impl ProviderFactory {
    pub fn new() -> Self {
        let http = reqwest::Client::new();
        Self {
            openai: Arc::new(OpenAiClient::new(http.clone())),
            anthropic: Arc::new(AnthropicClient::new(http.clone())),
            ollama: Arc::new(OllamaClient::new(http.clone())),
            gemini: Arc::new(GeminiClient::new(http)),
        }
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionClientFactory for ProviderFactory {
    fn client_for(&self, provider: Provider) -> Arc<dyn CompletionClient> {
        match provider {
            Provider::OpenAi => self.openai.clone(),
            Provider::Anthropic => self.anthropic.clone(),
            Provider::Ollama => self.ollama.clone(),
            Provider::Gemini => self.gemini.clone(),
        }
    }
}

/// Accumulates raw network chunks and yields complete lines.
///
/// Streaming bodies split records at arbitrary byte boundaries, so a
/// partial trailing line stays buffered until its newline arrives.
pub(crate) struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self { buf: String::new() }
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line = self.buf[..pos].trim_end_matches('\r').to_string();
            self.buf.drain(..=pos);
            lines.push(line);
        }
        lines
    }
}

/// Extract the payload of an SSE `data:` line
pub(crate) fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// The `{role, content}` message shape shared by the chat-style APIs
#[derive(serde::Serialize)]
pub(crate) struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

pub(crate) fn to_wire_messages(turns: &[Turn]) -> Vec<WireMessage> {
    turns
        .iter()
        .map(|turn| WireMessage {
            role: match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "assistant",
            },
            content: turn.content.clone(),
        })
        .collect()
}

/// Surface a non-2xx response as a [`CompletionError::RequestFailed`]
/// carrying whatever body the provider sent back.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, CompletionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(CompletionError::RequestFailed {
        status: status.as_u16(),
        message: if message.is_empty() {
            status.to_string()
        } else {
            message
        },
    })
}

pub(crate) fn connection_error(e: reqwest::Error) -> CompletionError {
    CompletionError::ConnectionError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_holds_partial_lines() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"data: {\"par").is_empty());
        let lines = buffer.push(b"tial\": 1}\ndata: next\n");
        assert_eq!(lines, vec!["data: {\"partial\": 1}", "data: next"]);
    }

    #[test]
    fn test_line_buffer_strips_carriage_returns() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"event: ping\r\n\r\n");
        assert_eq!(lines, vec!["event: ping", ""]);
    }

    #[test]
    fn test_line_buffer_multiple_lines_in_one_chunk() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"a\nb\nc");
        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(buffer.push(b"\n"), vec!["c"]);
    }

    #[test]
    fn test_sse_data_extraction() {
        assert_eq!(sse_data("data: {\"x\":1}"), Some("{\"x\":1}"));
        assert_eq!(sse_data("data:[DONE]"), Some("[DONE]"));
        assert_eq!(sse_data("event: done"), None);
        assert_eq!(sse_data(""), None);
    }

    #[test]
    fn test_wire_messages_preserve_order_and_roles() {
        let turns = vec![
            Turn::user("question"),
            Turn::assistant("answer", "openai/gpt-4"),
        ];
        let wire = to_wire_messages(&turns);
        assert_eq!(wire[0].role, "user");
        assert_eq!(wire[1].role, "assistant");
        assert_eq!(wire[1].content, "answer");
    }
}

//! Remote summarization client (chat-completions wire format).

use crate::config::SummarizationConfig;
use crate::defaults;
use crate::error::{EchologError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Trait for language-model completion calls.
pub trait ChatCompleter: Send + Sync {
    /// Sends one system instruction and one user message; returns the
    /// model's reply text.
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

// Chat-completions request/response wire contract
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// HTTP client for a chat-completions compatible endpoint.
pub struct HttpChatCompleter {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

impl HttpChatCompleter {
    /// Creates a client from configuration.
    ///
    /// Fails with `ConfigMissingCredentials` when no API key is set.
    pub fn new(config: &SummarizationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EchologError::ConfigMissingCredentials {
                message: "summarization API key not set (summarization.api_key or ECHOLOG_API_KEY)"
                    .to_string(),
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| EchologError::Transport {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
        })
    }
}

impl ChatCompleter for HttpChatCompleter {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| EchologError::Transport {
                message: format!("summarization request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EchologError::Service {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ChatResponse = response.json().map_err(|e| EchologError::Service {
            status: status.as_u16(),
            message: format!("unparseable completion response: {}", e),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| EchologError::Service {
                status: status.as_u16(),
                message: "completion response contained no choices".to_string(),
            })
    }
}

/// Mock completer for testing.
///
/// Records every (system, user) prompt pair so tests can assert what
/// context was sent, or that no call happened at all.
pub struct MockChatCompleter {
    response: String,
    should_fail: bool,
    prompts: Mutex<Vec<(String, String)>>,
    calls: AtomicU32,
}

impl MockChatCompleter {
    /// Create a mock returning a fixed response.
    pub fn new() -> Self {
        Self {
            response: "mock summary".to_string(),
            should_fail: false,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Configure the response text.
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail every call with a transport error.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Total complete calls observed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// All (system, user) prompt pairs observed.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockChatCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatCompleter for MockChatCompleter {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));

        if self.should_fail {
            Err(EchologError::Transport {
                message: "mock completion failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_requires_api_key() {
        let config = SummarizationConfig::default();
        assert!(matches!(
            HttpChatCompleter::new(&config),
            Err(EchologError::ConfigMissingCredentials { .. })
        ));
    }

    #[test]
    fn test_http_client_builds_with_api_key() {
        let config = SummarizationConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert!(HttpChatCompleter::new(&config).is_ok());
    }

    #[test]
    fn test_request_serializes_wire_fields() {
        let body = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 256,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "instruction".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: "transcript".to_string(),
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "transcript");
    }

    #[test]
    fn test_response_parses_choices_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"a summary"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "a summary");
    }

    #[test]
    fn test_mock_records_prompts() {
        let llm = MockChatCompleter::new().with_response("ok");
        llm.complete("sys", "usr").unwrap();
        assert_eq!(llm.calls(), 1);
        assert_eq!(llm.prompts(), vec![("sys".to_string(), "usr".to_string())]);
    }

    #[test]
    fn test_mock_failure() {
        let llm = MockChatCompleter::new().with_failure();
        assert!(matches!(
            llm.complete("sys", "usr"),
            Err(EchologError::Transport { .. })
        ));
        assert_eq!(llm.calls(), 1);
    }
}

//! Remote speech-to-text client.

use crate::audio::wav::encode_wav;
use crate::config::TranscriptionConfig;
use crate::defaults;
use crate::error::{EchologError, Result};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (HTTP service vs mock).
pub trait SpeechToText: Send + Sync {
    /// Transcribe audio samples to text.
    ///
    /// # Arguments
    /// * `samples` - Audio as 16-bit PCM mono
    /// * `sample_rate` - Sample rate of the audio
    ///
    /// # Returns
    /// Transcribed text (possibly empty) or an error.
    fn transcribe(&self, samples: &[i16], sample_rate: u32) -> Result<String>;
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client for an OpenAI-compatible transcription endpoint.
///
/// Uploads a multipart body: `model`, `language`, and `file` holding a WAV
/// container (header + raw PCM payload). Expects `{"text": ...}` back.
pub struct HttpSpeechToText {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    language: String,
    api_key: String,
}

impl HttpSpeechToText {
    /// Creates a client from configuration.
    ///
    /// Fails with `ConfigMissingCredentials` when no API key is set.
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EchologError::ConfigMissingCredentials {
                message: "transcription API key not set (transcription.api_key or ECHOLOG_API_KEY)"
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
            language: config.language.clone(),
            api_key,
        })
    }
}

impl SpeechToText for HttpSpeechToText {
    fn transcribe(&self, samples: &[i16], sample_rate: u32) -> Result<String> {
        let wav = encode_wav(samples, sample_rate)?;

        let file_part = reqwest::blocking::multipart::Part::bytes(wav)
            .file_name("chunk.wav")
            .mime_str("audio/wav")
            .map_err(|e| EchologError::Transport {
                message: format!("failed to build upload part: {}", e),
            })?;

        let form = reqwest::blocking::multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .part("file", file_part);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| EchologError::Transport {
                message: format!("transcription request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EchologError::Service {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: TranscriptionResponse =
            response.json().map_err(|e| EchologError::Service {
                status: status.as_u16(),
                message: format!("unparseable transcription response: {}", e),
            })?;

        Ok(parsed.text)
    }
}

/// One scripted outcome for the mock transcriber.
enum MockOutcome {
    Text(String),
    Transport,
    Service(u16),
}

/// Mock transcriber for testing.
///
/// Plays back a script of outcomes, then repeats the configured default
/// response. Counts calls so tests can assert attempt totals.
pub struct MockSpeechToText {
    script: Mutex<VecDeque<MockOutcome>>,
    default_response: String,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl MockSpeechToText {
    /// Create a mock that always returns the default response.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_response: "mock transcription".to_string(),
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Configure the response returned after the script is exhausted.
    pub fn with_response(mut self, response: &str) -> Self {
        self.default_response = response.to_string();
        self
    }

    /// Queue `count` transport failures before successful responses.
    pub fn with_transport_failures(self, count: u32) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            for _ in 0..count {
                script.push_back(MockOutcome::Transport);
            }
        }
        self
    }

    /// Queue a non-2xx service failure.
    pub fn with_service_failure(self, status: u16) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(MockOutcome::Service(status));
        self
    }

    /// Queue one specific text response before the default kicks in.
    pub fn with_scripted_text(self, text: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(MockOutcome::Text(text.to_string()));
        self
    }

    /// Make every call block for `delay` (to simulate a slow service).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Total transcribe calls observed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSpeechToText {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechToText for MockSpeechToText {
    fn transcribe(&self, _samples: &[i16], _sample_rate: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(MockOutcome::Text(text)) => Ok(text),
            Some(MockOutcome::Transport) => Err(EchologError::Transport {
                message: "mock transport failure".to_string(),
            }),
            Some(MockOutcome::Service(status)) => Err(EchologError::Service {
                status,
                message: "mock service failure".to_string(),
            }),
            None => Ok(self.default_response.clone()),
        }
    }
}

//! Chunk transcription with bounded retry.

use crate::error::{EchologError, Result};
use crate::pipeline::types::AudioChunk;
use crate::remote::{Connectivity, SpeechToText};
use std::sync::Arc;
use std::time::Duration;

/// Transcribes one chunk at a time against a remote speech-to-text service.
///
/// Transport errors, non-2xx responses, and empty result text are all
/// retried up to the attempt limit with a fixed pause in between. Exhausting
/// the attempts is a per-chunk failure, not a pipeline failure; the caller
/// logs it and moves on.
pub struct TranscriptionWorker {
    stt: Arc<dyn SpeechToText>,
    connectivity: Arc<dyn Connectivity>,
    attempts: u32,
    retry_pause: Duration,
}

impl TranscriptionWorker {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        connectivity: Arc<dyn Connectivity>,
        attempts: u32,
        retry_pause: Duration,
    ) -> Self {
        Self {
            stt,
            connectivity,
            attempts: attempts.max(1),
            retry_pause,
        }
    }

    /// Transcribes `chunk`, returning non-empty text on success.
    pub fn process_chunk(&self, chunk: &AudioChunk) -> Result<String> {
        if !self.connectivity.is_connected() && !self.connectivity.reconnect() {
            return Err(EchologError::Transport {
                message: "network unreachable and reconnect failed".to_string(),
            });
        }

        for attempt in 1..=self.attempts {
            if attempt > 1 {
                std::thread::sleep(self.retry_pause);
            }

            match self.stt.transcribe(&chunk.samples, chunk.sample_rate) {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => {
                    eprintln!(
                        "echolog: transcription attempt {}/{} returned empty text",
                        attempt, self.attempts
                    );
                }
                Err(e) if e.is_retryable() => {
                    eprintln!(
                        "echolog: transcription attempt {}/{} failed: {}",
                        attempt, self.attempts, e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(EchologError::EmptyTranscription {
            attempts: self.attempts,
        })
    }
}

//! Data types flowing through the capture-to-summary pipeline.

use chrono::{DateTime, Local};

/// A chunk of audio ready for transcription.
///
/// Owned exclusively by whichever stage currently holds it; ownership moves
/// through the mailboxes, never shared.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM samples (16-bit signed integers, mono).
    pub samples: Vec<i16>,
    /// Wall-clock time the first sample of this chunk was captured.
    pub captured_at: DateTime<Local>,
    /// Sequence number for ordering.
    pub sequence: u64,
    /// Sample rate the samples were captured at.
    pub sample_rate: u32,
}

impl AudioChunk {
    /// Creates a new audio chunk.
    pub fn new(
        samples: Vec<i16>,
        captured_at: DateTime<Local>,
        sequence: u64,
        sample_rate: u32,
    ) -> Self {
        Self {
            samples,
            captured_at,
            sequence,
            sample_rate,
        }
    }

    /// Duration of the chunk in whole seconds, derived from the sample count.
    pub fn duration_secs(&self) -> u32 {
        (self.samples.len() as u64 / self.sample_rate.max(1) as u64) as u32
    }
}

/// A transcribed chunk on its way to summarization.
#[derive(Debug, Clone)]
pub struct TranscribedChunk {
    /// The transcribed text.
    pub text: String,
    /// When the source chunk's capture began.
    pub captured_at: DateTime<Local>,
    /// Duration of the source chunk in seconds.
    pub duration_secs: u32,
    /// Sequence number carried over from the source chunk.
    pub sequence: u64,
}

impl TranscribedChunk {
    /// Creates a transcribed chunk from its source chunk's metadata.
    pub fn new(text: String, chunk: &AudioChunk) -> Self {
        Self {
            text,
            captured_at: chunk.captured_at,
            duration_secs: chunk.duration_secs(),
            sequence: chunk.sequence,
        }
    }
}

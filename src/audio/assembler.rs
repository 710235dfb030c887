//! Chunk assembler: accumulates capture frames into fixed-length chunks.

use crate::pipeline::types::AudioChunk;
use chrono::{DateTime, Local};

/// Accumulates sample frames into fixed-capacity chunks.
///
/// `push` returns a completed chunk once capacity is reached; `flush` force-
/// completes a partial chunk on manual stop. Returning the chunk by value is
/// the ownership handoff: the assembler starts its next buffer immediately,
/// so capture never waits on downstream processing.
pub struct ChunkAssembler {
    buffer: Vec<i16>,
    capacity: usize,
    sample_rate: u32,
    chunk_start: Option<DateTime<Local>>,
    sequence: u64,
}

impl ChunkAssembler {
    /// Creates an assembler producing chunks of `capacity` samples.
    pub fn new(capacity: usize, sample_rate: u32) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            sample_rate,
            chunk_start: None,
            sequence: 0,
        }
    }

    /// Appends a frame of samples to the active buffer.
    ///
    /// Returns `Some(chunk)` when the buffer reaches capacity. Samples beyond
    /// the capacity boundary carry over into the next buffer, whose start
    /// time is recorded at the boundary.
    pub fn push(&mut self, samples: &[i16]) -> Option<AudioChunk> {
        if samples.is_empty() {
            return None;
        }

        if self.buffer.is_empty() {
            self.chunk_start = Some(Local::now());
        }

        let remaining = self.capacity.saturating_sub(self.buffer.len());
        if samples.len() < remaining {
            self.buffer.extend_from_slice(samples);
            return None;
        }

        let (fill, overflow) = samples.split_at(remaining);
        self.buffer.extend_from_slice(fill);
        let chunk = self.complete();

        if !overflow.is_empty() {
            self.chunk_start = Some(Local::now());
            self.buffer.extend_from_slice(overflow);
        }

        Some(chunk)
    }

    /// Force-completes the current partial chunk (manual stop).
    ///
    /// A flush with zero accumulated samples is a no-op.
    pub fn flush(&mut self) -> Option<AudioChunk> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.complete())
    }

    /// Number of samples accumulated toward the next chunk.
    pub fn pending_samples(&self) -> usize {
        self.buffer.len()
    }

    fn complete(&mut self) -> AudioChunk {
        let samples = std::mem::take(&mut self.buffer);
        let captured_at = self.chunk_start.take().unwrap_or_else(Local::now);
        let seq = self.sequence;
        self.sequence += 1;
        AudioChunk::new(samples, captured_at, seq, self.sample_rate)
    }
}

//! Pipeline state and the published status snapshot.
//!
//! Cross-context progress reporting goes through an immutable snapshot
//! swapped as a unit, so external readers never observe a torn mix of
//! independently updated flags.

use std::sync::{Arc, RwLock};

/// Which stage currently owns a chunk or transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// No capture session is active.
    #[default]
    Idle,
    /// Capture is running, nothing in flight downstream.
    Capturing,
    /// A chunk is being transcribed.
    Transcribing,
    /// A transcript is being summarized and persisted.
    Summarizing,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Capturing => "capturing",
            PipelineState::Transcribing => "transcribing",
            PipelineState::Summarizing => "summarizing",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of pipeline progress, published as one unit.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub state: PipelineState,
    /// Total samples fed into the assembler this session.
    pub samples_captured: u64,
    /// Chunks that completed the full capture-to-store path.
    pub chunks_completed: u64,
    /// Chunks lost anywhere along the path: transcription retries
    /// exhausted, backlog drops, or a missed flush deadline on stop.
    pub chunks_failed: u64,
    pub last_transcription: Option<String>,
    pub last_summary: Option<String>,
}

/// Publishes immutable [`StatusSnapshot`]s for lock-free-by-copy readers.
#[derive(Default)]
pub struct StatusBoard {
    current: RwLock<Arc<StatusSnapshot>>,
}

impl StatusBoard {
    /// Creates a board holding the default (idle) snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recently published snapshot.
    pub fn read(&self) -> Arc<StatusSnapshot> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Clones the current snapshot, applies `mutate`, and publishes the
    /// result as the new current snapshot.
    pub fn update<F: FnOnce(&mut StatusSnapshot)>(&self, mutate: F) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = (**guard).clone();
        mutate(&mut next);
        *guard = Arc::new(next);
    }

    /// Publishes only a state transition.
    pub fn set_state(&self, state: PipelineState) {
        self.update(|snap| snap.state = state);
    }
}

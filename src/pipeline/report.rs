//! Failure reporting for pipeline stages.

use std::fmt;

/// The pipeline stage a failure was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Capture,
    Transcription,
    Summarization,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Capture => "capture",
            PipelineStage::Transcription => "transcription",
            PipelineStage::Summarization => "summarization",
        };
        f.write_str(name)
    }
}

/// A failure observed while processing one item.
///
/// Carries the chunk sequence where one exists, so a reporter can correlate
/// drops and transcription failures with the records that never appeared.
#[derive(Debug, Clone)]
pub enum StageError {
    /// A completed chunk left the pipeline without being processed.
    ChunkDropped { sequence: u64, reason: String },
    /// One capture read failed; capture keeps going until the failure limit.
    ReadFailed { message: String },
    /// Transcription gave up on a chunk.
    TranscriptionFailed { sequence: u64, message: String },
    /// A record was stored with a failure marker in place of its summary.
    SummaryUnavailable { sequence: u64 },
    /// The stage cannot continue and is shutting down.
    Aborted { message: String },
}

impl StageError {
    /// Whether this failure ends the stage rather than one item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StageError::Aborted { .. })
    }

    /// The sequence of the chunk that was lost, if one was.
    pub fn lost_sequence(&self) -> Option<u64> {
        match self {
            StageError::ChunkDropped { sequence, .. }
            | StageError::TranscriptionFailed { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::ChunkDropped { sequence, reason } => {
                write!(f, "dropped chunk {}: {}", sequence, reason)
            }
            StageError::ReadFailed { message } => {
                write!(f, "audio read failed: {}", message)
            }
            StageError::TranscriptionFailed { sequence, message } => {
                write!(f, "chunk {} failed transcription: {}", sequence, message)
            }
            StageError::SummaryUnavailable { sequence } => {
                write!(f, "chunk {} stored without a summary", sequence)
            }
            StageError::Aborted { message } => {
                write!(f, "stage aborted: {}", message)
            }
        }
    }
}

/// Trait for reporting stage failures.
pub trait ErrorReporter: Send + Sync {
    /// Reports a failure from the given stage.
    fn report(&self, stage: PipelineStage, error: &StageError);
}

/// Default reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, stage: PipelineStage, error: &StageError) {
        eprintln!("echolog: [{}] {}", stage, error);
    }
}

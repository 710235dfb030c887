//! Capture-to-store pipeline: assembly, handoff, workers, orchestration.

pub mod mailbox;
pub mod orchestrator;
pub mod report;
pub mod state;
pub mod summarization_worker;
pub mod transcription_worker;
pub mod types;

pub use mailbox::Mailbox;
pub use orchestrator::{Pipeline, PipelineConfig, PipelineEvent, PipelineHandle, Services};
pub use report::{ErrorReporter, LogReporter, PipelineStage, StageError};
pub use state::{PipelineState, StatusBoard, StatusSnapshot};
pub use summarization_worker::{SUMMARY_UNAVAILABLE_PREFIX, SummarizationWorker};
pub use transcription_worker::TranscriptionWorker;
pub use types::{AudioChunk, TranscribedChunk};

//! echolog - always-on audio capture with remote transcription and
//! summarization.
//!
//! Audio is assembled into fixed-duration chunks, transcribed by a remote
//! speech-to-text service, summarized by a remote language model, and
//! persisted to a bounded transcript store that answers keyword, date/time,
//! and natural-language queries.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod remote;
pub mod store;

// Core traits (source → transcribe → summarize → store)
pub use audio::AudioSource;
pub use remote::{ChatCompleter, Connectivity, ResourceProbe, SpeechToText};

// Pipeline
pub use pipeline::{Pipeline, PipelineConfig, PipelineHandle, PipelineState, Services};

// Store and queries
pub use query::QueryEngine;
pub use store::{QueryFilter, TranscriptRecord, TranscriptStore};

// Error handling
pub use error::{EchologError, Result};

// Config
pub use config::Config;

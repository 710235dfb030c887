//! Transcript summarization.
//!
//! Unlike transcription, summarization never retries and never fails the
//! pipeline: every failure collapses into a marker string that is stored in
//! place of the summary. Transcription loss is worse than a missing summary.

use crate::error::EchologError;
use crate::remote::{ChatCompleter, Connectivity, ResourceProbe};
use std::sync::Arc;

/// Prefix shared by every failure marker this worker produces.
pub const SUMMARY_UNAVAILABLE_PREFIX: &str = "[summary unavailable";

const SUMMARY_SYSTEM_PROMPT: &str = "You summarize transcripts of recorded audio. Produce a short, \
     factual summary of the transcript you are given. Mention the topics \
     discussed and any decisions or action items. Do not add information \
     that is not in the transcript.";

/// Produces a summary string for one transcript.
pub struct SummarizationWorker {
    llm: Arc<dyn ChatCompleter>,
    connectivity: Arc<dyn Connectivity>,
    resources: Arc<dyn ResourceProbe>,
    min_free_memory: u64,
}

impl SummarizationWorker {
    pub fn new(
        llm: Arc<dyn ChatCompleter>,
        connectivity: Arc<dyn Connectivity>,
        resources: Arc<dyn ResourceProbe>,
        min_free_memory: u64,
    ) -> Self {
        Self {
            llm,
            connectivity,
            resources,
            min_free_memory,
        }
    }

    /// Summarizes `text`. Always returns a non-empty string; preconditions
    /// and remote failures return a marker instead of an error.
    pub fn process_text(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return marker("empty transcription");
        }

        if !self.connectivity.is_connected() && !self.connectivity.reconnect() {
            return marker("network unreachable");
        }

        let available = self.resources.available_memory();
        if available < self.min_free_memory {
            let e = EchologError::ResourceExhausted {
                available,
                required: self.min_free_memory,
            };
            return marker(&e.to_string());
        }

        match self.llm.complete(SUMMARY_SYSTEM_PROMPT, text) {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => marker("empty response"),
            Err(e) => marker(&e.to_string()),
        }
    }
}

fn marker(reason: &str) -> String {
    format!("{}: {}]", SUMMARY_UNAVAILABLE_PREFIX, reason)
}

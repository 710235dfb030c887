//! Query engine: routes a question to a time-window recap or a general
//! answer grounded in cached transcripts.

use crate::query::window::match_window;
use crate::remote::ChatCompleter;
use crate::store::{TranscriptRecord, TranscriptStore};
use chrono::Local;
use std::sync::{Arc, RwLock};

/// Returned for a time-window question when the window holds no records.
/// No remote call is made in that case.
pub const NO_DATA_MESSAGE: &str = "No transcripts were recorded in that time window.";

/// Returned for a general question when no records exist at all. Also
/// answered without a remote call: there is no context to ground a reply.
pub const NO_RECORDS_MESSAGE: &str = "No transcripts have been recorded yet.";

const WINDOW_SYSTEM_PROMPT: &str = "You are an assistant reviewing transcripts of recorded \
     audio. Produce a comprehensive summary of everything in the supplied \
     transcripts. Use only the supplied transcripts.";

const GENERAL_SYSTEM_PROMPT: &str = "You are an assistant answering questions about transcripts \
     of recorded audio. Answer strictly from the supplied transcripts. If \
     the answer is not present in them, reply that it was not found. Do \
     not invent information.";

/// Answers natural-language questions against the transcript store.
///
/// A question containing a recognized relative-time phrase is answered by
/// summarizing every record inside that window. Any other question is
/// answered from the cached recent records. Remote failures come back as a
/// marker string, never an empty one, so callers can detect failure by
/// content.
pub struct QueryEngine {
    store: Arc<RwLock<TranscriptStore>>,
    llm: Arc<dyn ChatCompleter>,
}

impl QueryEngine {
    pub fn new(store: Arc<RwLock<TranscriptStore>>, llm: Arc<dyn ChatCompleter>) -> Self {
        Self { store, llm }
    }

    /// Answers `question` relative to the current wall clock.
    pub fn answer(&self, question: &str) -> String {
        self.answer_at(question, Local::now().timestamp())
    }

    /// Answers `question` with `now` pinned, for deterministic windows.
    pub fn answer_at(&self, question: &str, now: i64) -> String {
        match match_window(question) {
            Some(window_secs) => self.answer_window(question, now, window_secs),
            None => self.answer_general(question),
        }
    }

    fn answer_window(&self, question: &str, now: i64, window_secs: i64) -> String {
        let records = match self.store.read() {
            Ok(store) => store.time_window(now, window_secs),
            Err(poisoned) => poisoned.into_inner().time_window(now, window_secs),
        };
        if records.is_empty() {
            return NO_DATA_MESSAGE.to_string();
        }

        let user = format!(
            "Transcripts from the requested window:\n\n{}\n\nRequest: {}",
            render_context(&records),
            question
        );
        self.complete(WINDOW_SYSTEM_PROMPT, &user)
    }

    fn answer_general(&self, question: &str) -> String {
        let records = match self.store.read() {
            Ok(store) => store.cached(),
            Err(poisoned) => poisoned.into_inner().cached(),
        };
        if records.is_empty() {
            return NO_RECORDS_MESSAGE.to_string();
        }

        let user = format!(
            "Recent transcripts:\n\n{}\n\nQuestion: {}",
            render_context(&records),
            question
        );
        self.complete(GENERAL_SYSTEM_PROMPT, &user)
    }

    /// Single attempt, no retry. A failed call yields a marker string.
    fn complete(&self, system: &str, user: &str) -> String {
        match self.llm.complete(system, user) {
            Ok(answer) => answer,
            Err(e) => format!("[query failed: {}]", e),
        }
    }
}

fn render_context(records: &[TranscriptRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "[{}] transcription: {}\nsummary: {}",
                r.timestamp, r.transcription, r.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

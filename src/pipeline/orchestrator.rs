//! Capture pipeline that runs from start until stop or end of input.
//!
//! Three threads with a fixed 1:1:1 stage mapping: capture feeds the chunk
//! assembler, the transcription worker drains the chunk mailbox, the
//! summarization worker drains the text mailbox and appends to the store.
//! At most one chunk is in flight end-to-end; capture keeps assembling the
//! next chunk while the workers process the current one.

use crate::audio::{AudioSource, ChunkAssembler};
use crate::defaults;
use crate::error::Result;
use crate::pipeline::mailbox::Mailbox;
use crate::pipeline::report::{ErrorReporter, LogReporter, PipelineStage, StageError};
use crate::pipeline::state::{PipelineState, StatusBoard, StatusSnapshot};
use crate::pipeline::summarization_worker::{SUMMARY_UNAVAILABLE_PREFIX, SummarizationWorker};
use crate::pipeline::transcription_worker::TranscriptionWorker;
use crate::pipeline::types::{AudioChunk, TranscribedChunk};
use crate::remote::{ChatCompleter, Connectivity, ResourceProbe, SpeechToText};
use crate::store::{TranscriptRecord, TranscriptStore};
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Consecutive capture-read failures tolerated before the session aborts.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 10;

/// How long a worker waits on its mailbox before re-checking shutdown.
const IDLE_POLL: Duration = Duration::from_millis(200);

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sample rate the source delivers.
    pub sample_rate: u32,
    /// Wall-clock seconds of audio per chunk.
    pub chunk_seconds: u32,
    /// Transcription attempts per chunk.
    pub attempts: u32,
    /// Pause between transcription attempts.
    pub retry_pause: Duration,
    /// Free-memory floor required before a summarization call.
    pub min_free_memory: u64,
    /// How long the manual-stop flush may wait for the pipeline slot.
    pub flush_deadline: Duration,
    /// How long `stop()` waits for worker threads before detaching them.
    pub stop_deadline: Duration,
    /// Optional non-blocking event stream for external observers.
    pub event_tx: Option<crossbeam_channel::Sender<PipelineEvent>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            chunk_seconds: defaults::CHUNK_SECONDS,
            attempts: defaults::TRANSCRIBE_ATTEMPTS,
            retry_pause: Duration::from_millis(defaults::RETRY_PAUSE_MS),
            min_free_memory: defaults::MIN_FREE_MEMORY,
            flush_deadline: Duration::from_secs(10),
            stop_deadline: Duration::from_secs(10),
            event_tx: None,
        }
    }
}

/// Remote services and environment probes the pipeline depends on.
#[derive(Clone)]
pub struct Services {
    pub stt: Arc<dyn SpeechToText>,
    pub llm: Arc<dyn ChatCompleter>,
    pub connectivity: Arc<dyn Connectivity>,
    pub resources: Arc<dyn ResourceProbe>,
}

/// Progress notifications for external observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A full chunk left the assembler.
    ChunkAssembled { sequence: u64 },
    /// A chunk was dropped after transcription attempts were exhausted.
    TranscriptionFailed { sequence: u64 },
    /// A record reached the store.
    RecordStored { sequence: u64 },
    /// The capture thread exited (end of input, stop, or read failure).
    CaptureEnded,
}

struct Shared {
    running: AtomicBool,
    capture_done: AtomicBool,
    /// Guards the end-to-end single-chunk-in-flight invariant. Claimed by
    /// capture when a chunk enters the pipeline, released when the chunk's
    /// record is stored or the chunk is dropped.
    slot_free: AtomicBool,
    chunk_box: Mailbox<AudioChunk>,
    text_box: Mailbox<TranscribedChunk>,
    status: StatusBoard,
}

impl Shared {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            capture_done: AtomicBool::new(false),
            slot_free: AtomicBool::new(true),
            chunk_box: Mailbox::new(),
            text_box: Mailbox::new(),
            status: StatusBoard::new(),
        }
    }

    fn claim_slot(&self) -> bool {
        self.slot_free
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release_slot(&self) {
        self.slot_free.store(true, Ordering::SeqCst);
    }
}

/// Capture-to-store pipeline: AudioSource → ChunkAssembler → transcription →
/// summarization → TranscriptStore.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a pipeline with the default (stderr) error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Starts the pipeline threads.
    ///
    /// Fails only if the audio source refuses to start; everything after
    /// that is reported through the error reporter and the status board.
    pub fn start(
        self,
        mut audio_source: Box<dyn AudioSource>,
        services: Services,
        store: Arc<RwLock<TranscriptStore>>,
    ) -> Result<PipelineHandle> {
        audio_source.start()?;

        let shared = Arc::new(Shared::new());
        let session_start = Local::now();
        shared.status.set_state(PipelineState::Capturing);

        let mut threads = Vec::new();

        threads.push(self.spawn_capture(audio_source, shared.clone()));
        threads.push(self.spawn_transcriber(services.clone(), shared.clone()));
        threads.push(self.spawn_summarizer(services, shared.clone(), store.clone(), session_start));

        Ok(PipelineHandle {
            shared,
            store,
            threads,
            stop_deadline: self.config.stop_deadline,
        })
    }

    fn emit(event_tx: &Option<crossbeam_channel::Sender<PipelineEvent>>, event: PipelineEvent) {
        if let Some(tx) = event_tx {
            let _ = tx.try_send(event);
        }
    }

    fn spawn_capture(
        &self,
        mut source: Box<dyn AudioSource>,
        shared: Arc<Shared>,
    ) -> JoinHandle<()> {
        let capacity = self.config.sample_rate as usize * self.config.chunk_seconds as usize;
        let mut assembler = ChunkAssembler::new(capacity, self.config.sample_rate);
        let reporter = self.error_reporter.clone();
        let flush_deadline = self.config.flush_deadline;
        let event_tx = self.config.event_tx.clone();

        thread::spawn(move || {
            let mut consecutive_errors = 0u32;
            // A completed chunk waiting for the pipeline slot. Capture keeps
            // assembling the next chunk instead of blocking on it.
            let mut pending: Option<AudioChunk> = None;

            while shared.running.load(Ordering::SeqCst) {
                if let Some(chunk) = pending.take() {
                    if shared.claim_slot() {
                        let sequence = chunk.sequence;
                        if shared.chunk_box.try_publish(chunk).is_err() {
                            // Slot-free implies an empty mailbox; a refusal
                            // here means the invariant broke upstream.
                            shared.release_slot();
                        } else {
                            Self::emit(&event_tx, PipelineEvent::ChunkAssembled { sequence });
                        }
                    } else {
                        pending = Some(chunk);
                    }
                }

                match source.read_samples() {
                    Ok(samples) if samples.is_empty() => {
                        if source.is_finite() {
                            break;
                        }
                        thread::sleep(Duration::from_millis(10));
                    }
                    Ok(samples) => {
                        consecutive_errors = 0;
                        shared
                            .status
                            .update(|s| s.samples_captured += samples.len() as u64);

                        if let Some(chunk) = assembler.push(&samples) {
                            if let Some(stale) = pending.replace(chunk) {
                                // No queuing beyond the single in-flight
                                // chunk; the older completed chunk is lost.
                                reporter.report(
                                    PipelineStage::Capture,
                                    &StageError::ChunkDropped {
                                        sequence: stale.sequence,
                                        reason: "pipeline backlog".to_string(),
                                    },
                                );
                                shared.status.update(|s| s.chunks_failed += 1);
                            }
                        }
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        reporter.report(
                            PipelineStage::Capture,
                            &StageError::ReadFailed {
                                message: e.to_string(),
                            },
                        );
                        if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                            reporter.report(
                                PipelineStage::Capture,
                                &StageError::Aborted {
                                    message: format!(
                                        "{} consecutive read failures",
                                        consecutive_errors
                                    ),
                                },
                            );
                            break;
                        }
                        thread::sleep(Duration::from_millis(100));
                    }
                }
            }

            if let Err(e) = source.stop() {
                eprintln!("echolog: audio source stop failed: {}", e);
            }

            // Drain the held chunk and any partial chunk into the pipeline
            // before declaring capture done, so nothing already recorded is
            // silently lost on stop.
            let flush_until = Instant::now() + flush_deadline;
            for chunk in pending.into_iter().chain(assembler.flush()) {
                let sequence = chunk.sequence;
                if Self::enter_with_deadline(&shared, chunk, flush_until) {
                    Self::emit(&event_tx, PipelineEvent::ChunkAssembled { sequence });
                } else {
                    reporter.report(
                        PipelineStage::Capture,
                        &StageError::ChunkDropped {
                            sequence,
                            reason: "flush deadline passed".to_string(),
                        },
                    );
                    shared.status.update(|s| s.chunks_failed += 1);
                }
            }

            shared.capture_done.store(true, Ordering::SeqCst);
            Self::emit(&event_tx, PipelineEvent::CaptureEnded);
        })
    }

    /// Waits for the pipeline slot until `deadline`, then publishes.
    fn enter_with_deadline(shared: &Shared, chunk: AudioChunk, deadline: Instant) -> bool {
        loop {
            if shared.claim_slot() {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if shared.chunk_box.publish_deadline(chunk, remaining).is_ok() {
                    return true;
                }
                shared.release_slot();
                return false;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn spawn_transcriber(&self, services: Services, shared: Arc<Shared>) -> JoinHandle<()> {
        let worker = TranscriptionWorker::new(
            services.stt,
            services.connectivity,
            self.config.attempts,
            self.config.retry_pause,
        );
        let reporter = self.error_reporter.clone();
        let event_tx = self.config.event_tx.clone();
        let handoff_deadline = self.config.flush_deadline;

        thread::spawn(move || {
            loop {
                let Some(chunk) = shared.chunk_box.take_timeout(IDLE_POLL) else {
                    if shared.capture_done.load(Ordering::SeqCst) && shared.chunk_box.is_idle() {
                        break;
                    }
                    continue;
                };

                shared.status.set_state(PipelineState::Transcribing);
                match worker.process_chunk(&chunk) {
                    Ok(text) => {
                        shared
                            .status
                            .update(|s| s.last_transcription = Some(text.clone()));
                        let transcribed = TranscribedChunk::new(text, &chunk);
                        // Publish downstream before finish() so an exit
                        // check never observes both mailboxes idle while a
                        // transcript is between stages.
                        if shared
                            .text_box
                            .publish_deadline(transcribed, handoff_deadline)
                            .is_err()
                        {
                            reporter.report(
                                PipelineStage::Transcription,
                                &StageError::ChunkDropped {
                                    sequence: chunk.sequence,
                                    reason: "summarization backlog".to_string(),
                                },
                            );
                            shared.status.update(|s| s.chunks_failed += 1);
                            shared.release_slot();
                        }
                    }
                    Err(e) => {
                        reporter.report(
                            PipelineStage::Transcription,
                            &StageError::TranscriptionFailed {
                                sequence: chunk.sequence,
                                message: e.to_string(),
                            },
                        );
                        shared.status.update(|s| {
                            s.chunks_failed += 1;
                            if s.state == PipelineState::Transcribing {
                                s.state = PipelineState::Capturing;
                            }
                        });
                        shared.release_slot();
                        Self::emit(
                            &event_tx,
                            PipelineEvent::TranscriptionFailed {
                                sequence: chunk.sequence,
                            },
                        );
                    }
                }
                shared.chunk_box.finish();
            }
        })
    }

    fn spawn_summarizer(
        &self,
        services: Services,
        shared: Arc<Shared>,
        store: Arc<RwLock<TranscriptStore>>,
        session_start: chrono::DateTime<Local>,
    ) -> JoinHandle<()> {
        let worker = SummarizationWorker::new(
            services.llm,
            services.connectivity,
            services.resources,
            self.config.min_free_memory,
        );
        let reporter = self.error_reporter.clone();
        let event_tx = self.config.event_tx.clone();

        thread::spawn(move || {
            loop {
                let Some(transcribed) = shared.text_box.take_timeout(IDLE_POLL) else {
                    if shared.capture_done.load(Ordering::SeqCst)
                        && shared.chunk_box.is_idle()
                        && shared.text_box.is_idle()
                    {
                        break;
                    }
                    continue;
                };

                shared.status.set_state(PipelineState::Summarizing);
                let summary = worker.process_text(&transcribed.text);
                if summary.starts_with(SUMMARY_UNAVAILABLE_PREFIX) {
                    reporter.report(
                        PipelineStage::Summarization,
                        &StageError::SummaryUnavailable {
                            sequence: transcribed.sequence,
                        },
                    );
                }

                let record = TranscriptRecord::new(
                    Local::now(),
                    transcribed.captured_at,
                    session_start,
                    transcribed.text,
                    summary.clone(),
                )
                .with_duration(transcribed.duration_secs);

                match store.write() {
                    Ok(mut store) => store.append(record),
                    Err(poisoned) => poisoned.into_inner().append(record),
                }

                shared.status.update(|s| {
                    s.chunks_completed += 1;
                    s.last_summary = Some(summary.clone());
                    s.state = if shared.running.load(Ordering::SeqCst)
                        && !shared.capture_done.load(Ordering::SeqCst)
                    {
                        PipelineState::Capturing
                    } else {
                        PipelineState::Idle
                    };
                });
                shared.release_slot();
                shared.text_box.finish();
                Self::emit(
                    &event_tx,
                    PipelineEvent::RecordStored {
                        sequence: transcribed.sequence,
                    },
                );
            }

            shared.status.set_state(PipelineState::Idle);
        })
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    shared: Arc<Shared>,
    store: Arc<RwLock<TranscriptStore>>,
    threads: Vec<JoinHandle<()>>,
    stop_deadline: Duration,
}

impl PipelineHandle {
    /// Latest published status snapshot.
    pub fn status(&self) -> Arc<StatusSnapshot> {
        self.shared.status.read()
    }

    /// True until `stop()` is requested.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// The transcript store this pipeline appends to.
    pub fn store(&self) -> Arc<RwLock<TranscriptStore>> {
        self.store.clone()
    }

    /// Blocks until the pipeline drains on its own (finite sources).
    pub fn wait(mut self) {
        for handle in self.threads.drain(..) {
            if let Err(panic_info) = handle.join() {
                eprintln!(
                    "echolog: pipeline thread panicked: {}",
                    panic_message(&panic_info)
                );
            }
        }
    }

    /// Stops the pipeline.
    ///
    /// Signals shutdown and waits up to the stop deadline for the workers.
    /// Capture flushes its partial chunk into the pipeline on the way out;
    /// in-flight remote calls are bounded by their own timeouts. Threads
    /// still running after the deadline are detached and die with the
    /// process.
    pub fn stop(mut self) {
        self.shared.running.store(false, Ordering::SeqCst);

        let deadline = Instant::now() + self.stop_deadline;
        let poll_interval = Duration::from_millis(50);

        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        eprintln!(
                            "echolog: pipeline thread panicked: {}",
                            panic_message(&panic_info)
                        );
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "echolog: shutdown timeout, {} thread(s) still running, detaching",
                    self.threads.len()
                );
                break;
            }

            thread::sleep(poll_interval);
        }
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> &str {
    panic_info
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
}

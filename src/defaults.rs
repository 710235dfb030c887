//! Default configuration constants for echolog.
//!
//! Shared constants used across configuration types to ensure consistency
//! and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz mono is the standard input format for speech-to-text services and
/// keeps chunk uploads small.
pub const SAMPLE_RATE: u32 = 16000;

/// Default frame size in samples read from the audio source per poll.
///
/// 1600 samples = 100ms at 16kHz. Small enough that the capture loop stays
/// responsive to stop requests, large enough to keep poll overhead low.
pub const FRAME_SAMPLES: usize = 1600;

/// Default chunk duration in seconds.
///
/// Each chunk is submitted to the transcription service as a whole. 30s
/// balances transcription quality (enough context) against upload size and
/// the latency of results becoming queryable.
pub const CHUNK_SECONDS: u32 = 30;

/// Total transcription attempts per chunk (first try + retries).
pub const TRANSCRIBE_ATTEMPTS: u32 = 3;

/// Pause between transcription attempts in milliseconds.
pub const RETRY_PAUSE_MS: u64 = 2000;

/// HTTP timeout for remote service calls in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum number of records retained in the persisted store.
///
/// Rotation evicts the oldest records beyond this ceiling.
pub const STORE_MAX_RECORDS: usize = 100;

/// Number of recent records held in the in-memory cache.
pub const STORE_CACHE_SIZE: usize = 25;

/// Maximum number of records a single query returns.
pub const QUERY_RESULT_LIMIT: usize = 100;

/// Minimum free memory in bytes required before a summarization call.
///
/// Building the request context duplicates the transcript text several
/// times; refuse to start when the system is close to exhaustion.
pub const MIN_FREE_MEMORY: u64 = 64 * 1024 * 1024;

/// Default transcription service endpoint (OpenAI-compatible).
pub const STT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Default transcription model identifier.
pub const STT_MODEL: &str = "whisper-1";

/// Default language hint for transcription.
pub const STT_LANGUAGE: &str = "en";

/// Default summarization service endpoint (chat-completions compatible).
pub const LLM_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default summarization model identifier.
pub const LLM_MODEL: &str = "gpt-4o-mini";

/// Default token budget for summarization responses.
pub const LLM_MAX_TOKENS: u32 = 512;

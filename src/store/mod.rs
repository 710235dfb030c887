//! Transcript persistence: records, the bounded store, and queries.

pub mod record;
pub mod store;

pub use record::{LOCAL_TIMESTAMP_FORMAT, TranscriptRecord};
pub use store::{QueryFilter, TranscriptStore};

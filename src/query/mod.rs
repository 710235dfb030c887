//! Natural-language queries over the transcript store.

pub mod engine;
pub mod window;

pub use engine::{NO_DATA_MESSAGE, NO_RECORDS_MESSAGE, QueryEngine};
pub use window::match_window;

//! Local filesystem backend for hark state.
//!
//! The state document lives in a single JSON file; writers coordinate
//! through a sibling `.lock` file plus an in-process mutex.

mod lock;
mod storage;

pub use lock::{FileLock, DEFAULT_LOCK_RETRIES, DEFAULT_LOCK_RETRY_DELAY};
pub use storage::{JsonFileStore, LOCK_FILE_SUFFIX};

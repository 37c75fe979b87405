mod file;

pub use file::{FileLock, DEFAULT_LOCK_RETRIES, DEFAULT_LOCK_RETRY_DELAY};

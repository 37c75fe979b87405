mod json_file;

pub use json_file::{JsonFileStore, LOCK_FILE_SUFFIX};

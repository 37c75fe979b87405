//! Errors that abort daemon startup.

use std::path::PathBuf;

use hark_core::HarkError;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Error looking up current user: home directory unavailable")]
    HomeDirUnavailable,

    #[error("Failed to create state directory {path}: {source}")]
    StateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to initialize state: {0}")]
    State(#[from] HarkError),

    #[error("Invalid route table: {0}")]
    Routes(#[from] crate::routing::PatternError),
}

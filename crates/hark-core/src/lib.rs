//! Core traits and types for the hark machine state daemon.
//!
//! This crate defines the abstractions shared between the daemon and its
//! storage backends:
//! - `Machine`: the stored entity and its `Validate` contract
//! - `StateStore`: list / get / create over the persisted document
//! - `LockManager`: writer exclusion with scoped release
//! - `HarkError`: the tagged error taxonomy surfaced to clients

mod error;
mod lock;
mod machine;
mod memory;
mod state;

pub use error::{ErrorKind, HarkError, DEFAULT_ERROR_CODE};
pub use lock::{HeldLock, LockGuard, LockManager};
pub use machine::{Machine, Validate};
pub use memory::MemoryStore;
pub use state::{StateDocument, StateStore};

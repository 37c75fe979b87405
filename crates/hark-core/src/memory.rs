use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::HarkError;
use crate::machine::{Machine, Validate};
use crate::state::{StateDocument, StateStore};

/// In-memory [`StateStore`] for tests.
///
/// Can be seeded with any document and inspected after writes. Writes
/// follow the same validate / check / append sequence as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<StateDocument>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with `document`.
    pub fn with_document(document: StateDocument) -> Self {
        Self {
            document: Mutex::new(document),
            writes: AtomicUsize::new(0),
        }
    }

    /// Snapshot of the current document.
    pub async fn document(&self) -> StateDocument {
        self.document.lock().await.clone()
    }

    /// Number of successful document writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list_machines(&self) -> Result<Vec<Machine>, HarkError> {
        Ok(self.document.lock().await.machines.clone())
    }

    async fn create_machine(&self, machine: Machine) -> Result<(), HarkError> {
        machine.validate()?;

        let mut document = self.document.lock().await;
        let mut next = document.clone();
        next.insert(machine)?;
        *document = next;
        self.writes.fetch_add(1, Ordering::SeqCst);

        debug!("Stored {} machines in memory", document.machines.len());
        Ok(())
    }
}

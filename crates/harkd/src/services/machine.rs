use std::sync::Arc;

use hark_core::{HarkError, Machine, StateStore};
use tracing::{info, instrument};

/// Machine operations exposed over HTTP.
#[derive(Clone)]
pub struct MachineService {
    store: Arc<dyn StateStore>,
}

impl MachineService {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// All machines managed by hark, in creation order.
    pub async fn get_machines(&self) -> Result<Vec<Machine>, HarkError> {
        self.store.list_machines().await
    }

    /// Look up a machine by id, failing with `NotFound` if absent.
    pub async fn get_machine_by_id(&self, machine_id: &str) -> Result<Machine, HarkError> {
        self.store.get_machine(machine_id).await
    }

    #[instrument(skip(self, machine), level = "debug", fields(machine_id = %machine.id))]
    pub async fn create_machine(&self, machine: Machine) -> Result<(), HarkError> {
        let machine_id = machine.id.clone();
        self.store.create_machine(machine).await?;
        info!("Created machine {}", machine_id);
        Ok(())
    }
}

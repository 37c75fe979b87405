use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::HarkError;
use crate::machine::Machine;

/// The single document persisted by a state store.
///
/// Machines keep insertion order and ids are unique within the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub machines: Vec<Machine>,
}

/// Older daemons wrote an empty document as `{"machines":null}`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Machine>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Machine>>::deserialize(deserializer)?.unwrap_or_default())
}

impl StateDocument {
    /// Get a machine by ID.
    pub fn get(&self, machine_id: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.id == machine_id)
    }

    /// Check if a machine exists.
    pub fn contains(&self, machine_id: &str) -> bool {
        self.machines.iter().any(|m| m.id == machine_id)
    }

    /// Append a machine, rejecting duplicate ids.
    pub fn insert(&mut self, machine: Machine) -> Result<(), HarkError> {
        if self.contains(&machine.id) {
            return Err(HarkError::entity_conflict(format!(
                "already have machine with id {:?}",
                machine.id
            )));
        }
        self.machines.push(machine);
        Ok(())
    }

    /// Parse a persisted document. Anything that is not a well-formed
    /// document fails outright.
    pub fn from_json(bytes: &[u8]) -> Result<Self, HarkError> {
        serde_json::from_slice(bytes).map_err(|e| HarkError::serialization("parsing state", e))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, HarkError> {
        serde_json::to_vec(self).map_err(|e| HarkError::serialization("serializing state", e))
    }
}

/// Storage abstraction for the machine state document.
///
/// Reads take no lock. Writes are serialized by the implementation and must
/// reload the document from the backing medium before mutating it.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns the backend identifier (e.g., "json-file", "memory").
    fn backend_name(&self) -> &'static str;

    /// List all machines in insertion order.
    async fn list_machines(&self) -> Result<Vec<Machine>, HarkError>;

    /// Look up a single machine.
    async fn get_machine(&self, machine_id: &str) -> Result<Machine, HarkError> {
        self.list_machines()
            .await?
            .into_iter()
            .find(|m| m.id == machine_id)
            .ok_or_else(|| HarkError::machine_not_found(machine_id))
    }

    /// Validate and append a machine.
    ///
    /// Fails with `BadRequest` on invalid fields and `Conflict` when the id
    /// is already taken; the stored document is left untouched in both cases.
    async fn create_machine(&self, machine: Machine) -> Result<(), HarkError>;
}

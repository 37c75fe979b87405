use serde::{Deserialize, Serialize};

use crate::error::HarkError;

/// Anything that can check its own fields before being accepted.
pub trait Validate {
    /// Returns the first validation failure, if any.
    fn validate(&self) -> Result<(), HarkError>;
}

/// Metadata for a single managed virtual machine.
///
/// Fields other than `id` default when absent so that documents written by
/// older daemons still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "memoryMB", default)]
    pub memory_mb: u64,
}

impl Machine {
    pub fn new(id: impl Into<String>, name: impl Into<String>, memory_mb: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            memory_mb,
        }
    }
}

impl Validate for Machine {
    fn validate(&self) -> Result<(), HarkError> {
        if self.id.is_empty() {
            return Err(HarkError::entity_invalid("machine id cannot be empty"));
        }
        if self.name.is_empty() {
            return Err(HarkError::entity_invalid("machine name cannot be empty"));
        }
        if self.memory_mb == 0 {
            return Err(HarkError::entity_invalid("machine memoryMB cannot be 0"));
        }
        Ok(())
    }
}

use std::sync::Arc;

use serde::Serialize;

use crate::command::CommandRunner;
use crate::driver::{self, DriverInfo};

/// Overall status of the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub healthy: bool,
}

/// System-level diagnostics and status.
#[derive(Clone)]
pub struct SystemService {
    runner: Arc<dyn CommandRunner>,
}

impl SystemService {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub fn get_status(&self) -> Status {
        Status { healthy: true }
    }

    pub async fn get_driver_info(&self) -> Vec<DriverInfo> {
        driver::get_driver_info(self.runner.as_ref()).await
    }
}

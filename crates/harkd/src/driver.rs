//! Hypervisor driver probes.

use serde::Serialize;

use crate::command::CommandRunner;

const VIRTUALBOX_DRIVER: &str = "virtualbox";
const VBOXMANAGE: &str = "VBoxManage";

/// Information about a particular driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    pub driver_name: String,
    pub available_on_platform: bool,
    pub installed: bool,
    pub healthy: bool,
    pub version: String,
}

/// Probe every driver hark supports.
pub async fn get_driver_info(runner: &dyn CommandRunner) -> Vec<DriverInfo> {
    vec![virtualbox_info(runner).await]
}

async fn virtualbox_info(runner: &dyn CommandRunner) -> DriverInfo {
    let installed = runner.have_on_path(VBOXMANAGE);

    // One run answers both health and version
    let (healthy, version) = if installed {
        let result = runner.run_simple(VBOXMANAGE, &["--version"]).await;
        if result.success() {
            (true, String::from_utf8_lossy(&result.output).trim().to_string())
        } else {
            (false, String::new())
        }
    } else {
        (false, String::new())
    };

    DriverInfo {
        driver_name: VIRTUALBOX_DRIVER.to_string(),
        // VirtualBox runs on every supported platform
        available_on_platform: true,
        installed,
        healthy,
        version,
    }
}

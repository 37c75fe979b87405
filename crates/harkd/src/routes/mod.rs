//! HTTP route tables.

mod machine;
mod system;

use crate::routing::RouteMap;
use crate::services::{MachineService, SystemService};

/// Path parameter carrying the machine id.
pub const MACHINE_ID_PARAM: &str = "machine_id";

/// Build the full route table. System routes come first; a pattern
/// defined by a later table replaces the earlier one outright.
pub fn route_map(system: SystemService, machines: MachineService) -> RouteMap {
    RouteMap::merge([system::route_map(system), machine::route_map(machines)])
}

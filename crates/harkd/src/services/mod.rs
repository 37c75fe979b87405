mod machine;
mod system;

pub use machine::MachineService;
pub use system::{Status, SystemService};

// Hardware abstraction for the two-wheel DDSM115 base
//
// Provides:
// - Hardware description and parameter parsing
// - The callback contract a host drives (`SystemInterface`)
// - The DDSM115 differential drive system
// - A host-side lifecycle component that enforces legal transitions

mod error;
pub mod info;
pub mod interface;
mod lifecycle;
mod system;

pub use error::HardwareError;
pub use info::{ComponentInfo, HardwareConfig, HardwareInfo, InterfaceInfo};
pub use interface::{
    CallbackReturn, CommandInterface, HW_IF_POSITION, HW_IF_VELOCITY, ReturnType, StateInterface,
    SystemInterface,
};
pub use lifecycle::{HardwareComponent, LifecycleState};
pub use system::DiffDriveDdsm115Hardware;

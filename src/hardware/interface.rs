// Callback contract between a hardware system and the host that drives it

use std::time::{Duration, Instant};

use super::error::HardwareError;
use super::info::HardwareInfo;

/// Standard interface names
pub const HW_IF_POSITION: &str = "position";
pub const HW_IF_VELOCITY: &str = "velocity";

/// Snapshot of one exported state slot
#[derive(Debug, Clone, PartialEq)]
pub struct StateInterface {
    pub prefix: String,
    pub interface: String,
    pub value: f64,
}

impl StateInterface {
    pub fn new(prefix: &str, interface: &str, value: f64) -> Self {
        Self {
            prefix: prefix.to_string(),
            interface: interface.to_string(),
            value,
        }
    }

    /// Fully qualified name, e.g. `left_wheel_joint/position`
    pub fn name(&self) -> String {
        format!("{}/{}", self.prefix, self.interface)
    }
}

/// One writable command slot; values go in through `SystemInterface::set_command`
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInterface {
    pub prefix: String,
    pub interface: String,
}

impl CommandInterface {
    pub fn new(prefix: &str, interface: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            interface: interface.to_string(),
        }
    }

    pub fn name(&self) -> String {
        format!("{}/{}", self.prefix, self.interface)
    }
}

/// Lifecycle callback status reported to the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallbackReturn {
    Success,
    Error,
}

impl<T> From<&Result<T, HardwareError>> for CallbackReturn {
    fn from(result: &Result<T, HardwareError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(_) => Self::Error,
        }
    }
}

/// Per-tick status reported to the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnType {
    Ok,
    Error,
}

impl<T> From<&Result<T, HardwareError>> for ReturnType {
    fn from(result: &Result<T, HardwareError>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(_) => Self::Error,
        }
    }
}

/// A hardware component with position/velocity state and velocity commands
///
/// The host calls `on_init` once, then the lifecycle callbacks, and while
/// active it calls `read` then `write` once per control period from a single
/// thread.
pub trait SystemInterface {
    fn on_init(&mut self, info: &HardwareInfo) -> Result<(), HardwareError>;

    fn on_configure(&mut self) -> Result<(), HardwareError>;

    fn on_cleanup(&mut self) -> Result<(), HardwareError>;

    fn on_activate(&mut self) -> Result<(), HardwareError>;

    fn on_deactivate(&mut self) -> Result<(), HardwareError>;

    fn export_state_interfaces(&self) -> Vec<StateInterface>;

    fn export_command_interfaces(&self) -> Vec<CommandInterface>;

    /// Store a command value for the next `write`
    fn set_command(&mut self, prefix: &str, interface: &str, value: f64)
    -> Result<(), HardwareError>;

    fn read(&mut self, time: Instant, period: Duration) -> Result<(), HardwareError>;

    fn write(&mut self, time: Instant, period: Duration) -> Result<(), HardwareError>;
}

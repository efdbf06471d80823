// Hardware description handed to the system at init
//
// Mirrors what a robot description declares for one hardware component: a
// flat map of string parameters and the joints with their interfaces in
// declaration order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::error::HardwareError;
use super::interface::{HW_IF_POSITION, HW_IF_VELOCITY};
use crate::motor::ddsm115::MAX_RPM;

/// One named interface on a joint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
}

impl InterfaceInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// A joint and its interfaces, order preserved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    #[serde(default)]
    pub command_interfaces: Vec<InterfaceInfo>,
    #[serde(default)]
    pub state_interfaces: Vec<InterfaceInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub name: String,
    #[serde(default)]
    pub hardware_parameters: HashMap<String, String>,
    #[serde(default)]
    pub joints: Vec<ComponentInfo>,
}

impl HardwareInfo {
    /// Load a description from a JSON file
    pub fn from_json_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn joint(&self, name: &str) -> Option<&ComponentInfo> {
        self.joints.iter().find(|joint| joint.name == name)
    }
}

/// Connection and wheel parameters parsed from the description
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareConfig {
    pub left_wheel_name: String,
    pub right_wheel_name: String,
    pub device: String,
    pub baud_rate: u32,
    pub timeout_ms: u64,
    pub left_wheel_id: u8,
    pub right_wheel_id: u8,
    /// Scale from rad/s commands to device velocity units
    pub velocity_gain: f64,
    /// Acceleration time per RPM sent with each velocity command
    pub ramp: u8,
}

pub const DEFAULT_VELOCITY_GAIN: f64 = 10.0;
pub const DEFAULT_RAMP: u8 = 3;

impl HardwareConfig {
    pub fn from_parameters(params: &HashMap<String, String>) -> Result<Self, HardwareError> {
        let cfg = Self {
            left_wheel_name: required(params, "left_wheel_name")?.to_string(),
            right_wheel_name: required(params, "right_wheel_name")?.to_string(),
            device: required(params, "device")?.to_string(),
            baud_rate: parse(params, "baud_rate")?,
            timeout_ms: parse(params, "timeout_ms")?,
            left_wheel_id: parse(params, "left_wheel_id")?,
            right_wheel_id: parse(params, "right_wheel_id")?,
            velocity_gain: parse_or(params, "velocity_gain", DEFAULT_VELOCITY_GAIN)?,
            ramp: parse_or(params, "ramp", DEFAULT_RAMP)?,
        };

        // Each wheel needs its own joint and its own motor
        if cfg.right_wheel_name == cfg.left_wheel_name {
            return Err(HardwareError::InvalidParameter {
                name: "right_wheel_name",
                value: cfg.right_wheel_name,
                reason: "same joint as left_wheel_name".to_string(),
            });
        }
        if cfg.right_wheel_id == cfg.left_wheel_id {
            return Err(HardwareError::InvalidParameter {
                name: "right_wheel_id",
                value: cfg.right_wheel_id.to_string(),
                reason: "same motor id as left_wheel_id".to_string(),
            });
        }
        if !(cfg.velocity_gain.is_finite() && cfg.velocity_gain > 0.0) {
            return Err(HardwareError::InvalidParameter {
                name: "velocity_gain",
                value: cfg.velocity_gain.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Largest wheel command (rad/s) that reaches the motor without being clamped
    pub fn max_command(&self) -> f64 {
        f64::from(MAX_RPM) / self.velocity_gain
    }
}

fn required<'a>(
    params: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, HardwareError> {
    params
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or(HardwareError::MissingParameter(name))
}

fn parse_value<T>(name: &'static str, value: &str) -> Result<T, HardwareError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| HardwareError::InvalidParameter {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse<T>(params: &HashMap<String, String>, name: &'static str) -> Result<T, HardwareError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(name, required(params, name)?)
}

fn parse_or<T>(
    params: &HashMap<String, String>,
    name: &'static str,
    default: T,
) -> Result<T, HardwareError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match params.get(name).map(|value| value.trim()) {
        Some(value) if !value.is_empty() => parse_value(name, value),
        _ => Ok(default),
    }
}

/// Build a joint with one velocity command and position + velocity state
pub fn velocity_joint(name: &str) -> ComponentInfo {
    ComponentInfo {
        name: name.to_string(),
        command_interfaces: vec![InterfaceInfo::new(HW_IF_VELOCITY)],
        state_interfaces: vec![
            InterfaceInfo::new(HW_IF_POSITION),
            InterfaceInfo::new(HW_IF_VELOCITY),
        ],
    }
}

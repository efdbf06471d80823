// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::hardware::{HW_IF_POSITION, HW_IF_VELOCITY, StateInterface};

// Command from teleop/scripts -> runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseCommand {
    pub x_vel: f64,     // m/s
    pub theta_vel: f64, // rad/s
}

/// One joint as published by the runtime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    pub name: String,
    pub position: f64,
    pub velocity: f64,
}

/// Wheel state published every tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointStates {
    pub joints: Vec<JointState>,
}

// Groups exported `<joint>/position` and `<joint>/velocity` slots per joint,
// keeping export order
impl From<&[StateInterface]> for JointStates {
    fn from(states: &[StateInterface]) -> Self {
        let mut joints: Vec<JointState> = Vec::new();
        for state in states {
            let idx = match joints.iter().position(|j| j.name == state.prefix) {
                Some(idx) => idx,
                None => {
                    joints.push(JointState {
                        name: state.prefix.clone(),
                        ..JointState::default()
                    });
                    joints.len() - 1
                }
            };
            match state.interface.as_str() {
                HW_IF_POSITION => joints[idx].position = state.value,
                HW_IF_VELOCITY => joints[idx].velocity = state.value,
                _ => {}
            }
        }
        Self { joints }
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    HardwareError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_states_from_interfaces() {
        let states = [
            StateInterface::new("left_wheel_joint", "position", 1.0),
            StateInterface::new("left_wheel_joint", "velocity", 2.0),
            StateInterface::new("right_wheel_joint", "position", -1.0),
            StateInterface::new("right_wheel_joint", "velocity", -2.0),
        ];
        let msg = JointStates::from(&states[..]);
        assert_eq!(msg.joints.len(), 2);
        assert_eq!(msg.joints[0].name, "left_wheel_joint");
        assert_eq!(msg.joints[1].position, -1.0);
        assert_eq!(msg.joints[1].velocity, -2.0);
    }

    #[test]
    fn test_health_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RuntimeHealth::HardwareError).unwrap(),
            "\"hardware_error\""
        );
    }
}

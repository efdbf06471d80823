use crate::motor::Ddsm115Error;

use super::lifecycle::LifecycleState;

/// Errors reported by the hardware system and its lifecycle
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("Missing hardware parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("Invalid hardware parameter '{name}' = '{value}': {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Joint '{joint}' has {found} command interfaces found. 1 expected.")]
    CommandInterfaceCount { joint: String, found: usize },

    #[error("Joint '{joint}' have '{found}' command interface found. '{expected}' expected.")]
    CommandInterfaceType {
        joint: String,
        found: String,
        expected: &'static str,
    },

    #[error("Joint '{joint}' has {found} state interfaces. 2 expected.")]
    StateInterfaceCount { joint: String, found: usize },

    #[error("Joint '{joint}' have '{found}' as state interface {index}. '{expected}' expected.")]
    StateInterfaceOrder {
        joint: String,
        index: usize,
        found: String,
        expected: &'static str,
    },

    #[error("Wheel '{0}' is not declared as a joint")]
    UnknownJoint(String),

    #[error("No command interface '{0}'")]
    UnknownInterface(String),

    #[error("Hardware has not been initialized")]
    NotInitialized,

    #[error("Motor bus is not connected")]
    NotConnected,

    #[error("Cannot {transition} while {state:?}")]
    InvalidTransition {
        transition: &'static str,
        state: LifecycleState,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] Ddsm115Error),
}

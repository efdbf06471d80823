// Motor control module for the two-wheel differential base
//
// Provides:
// - DDSM115 serial protocol implementation
// - Transport seam used by the hardware system
// - Per-wheel state and unit conversions
// - Differential drive inverse kinematics

pub mod ddsm115;
pub mod kinematics;
mod transport;
mod wheel;

pub use ddsm115::{Ddsm115Bus, Ddsm115Error, DriveMode, Feedback};
pub use kinematics::{body_to_wheel, WheelVelocities};
pub use transport::{Ddsm115Comms, MotorTransport};
pub use wheel::{check_sign, degrees_to_radians, rpm_to_rad_per_sec, Wheel};

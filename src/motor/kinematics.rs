// Differential drive inverse kinematics for the two-wheel base
// Converts body-frame velocities (x, theta) to wheel angular velocities.

/// Wheel configuration for the base
pub const WHEEL_RADIUS: f64 = 0.05; // meters
pub const WHEEL_SEPARATION: f64 = 0.3; // meters (distance between wheel contact points)

/// Largest wheel command passed unclamped at the default velocity gain
/// (330 rpm device limit / gain 10)
pub const MAX_WHEEL_VEL: f64 = 33.0;

/// Wheel angular velocities in rad/s, positive = forward
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelVelocities {
    pub left: f64,
    pub right: f64,
}

impl WheelVelocities {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns velocities as array [left, right]
    pub fn as_array(&self) -> [f64; 2] {
        [self.left, self.right]
    }
}

/// Convert body-frame velocities to wheel velocities
///
/// # Arguments
/// * `x` - Forward velocity in m/s (positive = forward)
/// * `theta` - Rotational velocity in rad/s (positive = counter-clockwise)
pub fn body_to_wheel(x: f64, theta: f64) -> WheelVelocities {
    body_to_wheel_with_params(x, theta, WHEEL_RADIUS, WHEEL_SEPARATION, MAX_WHEEL_VEL)
}

/// Convert body-frame velocities to wheel velocities with custom parameters
///
/// When either wheel would exceed `max_wheel_vel`, both are scaled down by
/// the same factor so the turning radius is preserved.
pub fn body_to_wheel_with_params(
    x: f64,
    theta: f64,
    wheel_radius: f64,
    wheel_separation: f64,
    max_wheel_vel: f64,
) -> WheelVelocities {
    let half_track = wheel_separation / 2.0;
    let left = (x - theta * half_track) / wheel_radius;
    let right = (x + theta * half_track) / wheel_radius;

    let peak = left.abs().max(right.abs());
    if peak > max_wheel_vel {
        let scale = max_wheel_vel / peak;
        WheelVelocities::new(left * scale, right * scale)
    } else {
        WheelVelocities::new(left, right)
    }
}

// Per-wheel state and unit conversions
//
// The motor is treated as an incremental encoder: each telemetry angle is a
// delta that gets accumulated host-side into a continuous joint position.

use std::f64::consts::PI;

/// State of one driven wheel, in control-framework units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wheel {
    pub name: String,
    pub id: u8,
    /// Accumulated position (rad)
    pub pos: f64,
    /// Velocity (rad/s)
    pub vel: f64,
    /// Pending velocity command (rad/s)
    pub cmd: f64,
    /// Angle from the last telemetry read (deg)
    pub raw_angle: f64,
    /// Velocity from the last telemetry read (RPM)
    pub raw_rpm: f64,
}

impl Wheel {
    pub fn new(name: &str, id: u8) -> Self {
        Self {
            name: name.to_string(),
            id,
            ..Self::default()
        }
    }

    /// Fold one telemetry sample into the wheel state
    ///
    /// The direction sign comes from the pending command, which is always
    /// initialised, so motion accumulates in the commanded direction.
    pub fn apply_telemetry(&mut self, angle_deg: f64, rpm: f64) {
        let direction = check_sign(self.cmd);
        self.raw_angle = angle_deg;
        self.raw_rpm = rpm;
        self.pos += degrees_to_radians(angle_deg) * direction;
        self.vel = rpm_to_rad_per_sec(rpm);
    }
}

pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

pub fn rpm_to_rad_per_sec(rpm: f64) -> f64 {
    rpm * 2.0 * PI / 60.0
}

/// Polarity of motion: -1.0 for negative input, 1.0 otherwise (including -0.0)
pub fn check_sign(direction: f64) -> f64 {
    if direction < 0.0 { -1.0 } else { 1.0 }
}

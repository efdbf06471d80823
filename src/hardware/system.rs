// DDSM115 differential drive hardware system
//
// Bridges joint-level velocity commands and position/velocity state to the
// two hub motors on the serial bus.

use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::error::HardwareError;
use super::info::{ComponentInfo, HardwareConfig, HardwareInfo};
use super::interface::{
    CommandInterface, HW_IF_POSITION, HW_IF_VELOCITY, StateInterface, SystemInterface,
};
use crate::motor::{Ddsm115Comms, DriveMode, MotorTransport, Wheel};

pub struct DiffDriveDdsm115Hardware<T: MotorTransport = Ddsm115Comms> {
    comms: T,
    config: Option<HardwareConfig>,
    wheel_l: Wheel,
    wheel_r: Wheel,
}

impl DiffDriveDdsm115Hardware<Ddsm115Comms> {
    pub fn new() -> Self {
        Self::with_transport(Ddsm115Comms::new())
    }
}

impl Default for DiffDriveDdsm115Hardware<Ddsm115Comms> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MotorTransport> DiffDriveDdsm115Hardware<T> {
    pub fn with_transport(comms: T) -> Self {
        Self {
            comms,
            config: None,
            wheel_l: Wheel::default(),
            wheel_r: Wheel::default(),
        }
    }

    pub fn config(&self) -> Option<&HardwareConfig> {
        self.config.as_ref()
    }

    pub fn left_wheel(&self) -> &Wheel {
        &self.wheel_l
    }

    pub fn right_wheel(&self) -> &Wheel {
        &self.wheel_r
    }

    pub fn transport(&self) -> &T {
        &self.comms
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.comms
    }

    fn ensure_connected(&self) -> Result<(), HardwareError> {
        if self.comms.connected() {
            Ok(())
        } else {
            Err(HardwareError::NotConnected)
        }
    }
}

/// Each joint carries exactly one velocity command and position + velocity state
fn validate_joint(joint: &ComponentInfo) -> Result<(), HardwareError> {
    if joint.command_interfaces.len() != 1 {
        return Err(HardwareError::CommandInterfaceCount {
            joint: joint.name.clone(),
            found: joint.command_interfaces.len(),
        });
    }

    if joint.command_interfaces[0].name != HW_IF_VELOCITY {
        return Err(HardwareError::CommandInterfaceType {
            joint: joint.name.clone(),
            found: joint.command_interfaces[0].name.clone(),
            expected: HW_IF_VELOCITY,
        });
    }

    if joint.state_interfaces.len() != 2 {
        return Err(HardwareError::StateInterfaceCount {
            joint: joint.name.clone(),
            found: joint.state_interfaces.len(),
        });
    }

    for (index, expected) in [HW_IF_POSITION, HW_IF_VELOCITY].into_iter().enumerate() {
        if joint.state_interfaces[index].name != expected {
            return Err(HardwareError::StateInterfaceOrder {
                joint: joint.name.clone(),
                index,
                found: joint.state_interfaces[index].name.clone(),
                expected,
            });
        }
    }

    Ok(())
}

impl<T: MotorTransport> SystemInterface for DiffDriveDdsm115Hardware<T> {
    fn on_init(&mut self, info: &HardwareInfo) -> Result<(), HardwareError> {
        let result = HardwareConfig::from_parameters(&info.hardware_parameters).and_then(|cfg| {
            info.joints.iter().try_for_each(validate_joint)?;
            for wheel in [&cfg.left_wheel_name, &cfg.right_wheel_name] {
                if info.joint(wheel).is_none() {
                    return Err(HardwareError::UnknownJoint(wheel.clone()));
                }
            }
            Ok(cfg)
        });

        let cfg = result.inspect_err(|e| error!("Init of '{}' failed: {}", info.name, e))?;

        self.wheel_l = Wheel::new(&cfg.left_wheel_name, cfg.left_wheel_id);
        self.wheel_r = Wheel::new(&cfg.right_wheel_name, cfg.right_wheel_id);
        info!(
            "Initialized '{}': left '{}' (id {}), right '{}' (id {}) on {}",
            info.name,
            cfg.left_wheel_name,
            cfg.left_wheel_id,
            cfg.right_wheel_name,
            cfg.right_wheel_id,
            cfg.device
        );
        self.config = Some(cfg);
        Ok(())
    }

    fn on_configure(&mut self) -> Result<(), HardwareError> {
        info!("Configuring ...please wait...");
        let cfg = self.config.as_ref().ok_or(HardwareError::NotInitialized)?;

        if self.comms.connected() {
            self.comms.disconnect();
        }
        self.comms
            .connect(&cfg.device, cfg.baud_rate, cfg.timeout())
            .inspect_err(|e| error!("Failed to open {}: {}", cfg.device, e))?;

        info!("Successfully configured!");
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<(), HardwareError> {
        info!("Cleaning up ...please wait...");
        if self.comms.connected() {
            self.comms.disconnect();
        }
        info!("Successfully cleaned up!");
        Ok(())
    }

    fn on_activate(&mut self) -> Result<(), HardwareError> {
        info!("Activating ...please wait...");
        if let Err(e) = self.ensure_connected() {
            error!("Cannot activate: {}", e);
            return Err(e);
        }

        self.comms.set_mode(self.wheel_l.id, DriveMode::Velocity)?;
        self.comms.set_mode(self.wheel_r.id, DriveMode::Velocity)?;

        info!("Successfully activated!");
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<(), HardwareError> {
        info!("Deactivating ...please wait...");
        info!("Successfully deactivated!");
        Ok(())
    }

    fn export_state_interfaces(&self) -> Vec<StateInterface> {
        let mut states = Vec::with_capacity(4);
        for wheel in [&self.wheel_l, &self.wheel_r] {
            states.push(StateInterface::new(&wheel.name, HW_IF_POSITION, wheel.pos));
            states.push(StateInterface::new(&wheel.name, HW_IF_VELOCITY, wheel.vel));
        }
        states
    }

    fn export_command_interfaces(&self) -> Vec<CommandInterface> {
        vec![
            CommandInterface::new(&self.wheel_l.name, HW_IF_VELOCITY),
            CommandInterface::new(&self.wheel_r.name, HW_IF_VELOCITY),
        ]
    }

    fn set_command(
        &mut self,
        prefix: &str,
        interface: &str,
        value: f64,
    ) -> Result<(), HardwareError> {
        let wheel = if interface != HW_IF_VELOCITY || prefix.is_empty() {
            None
        } else if prefix == self.wheel_l.name {
            Some(&mut self.wheel_l)
        } else if prefix == self.wheel_r.name {
            Some(&mut self.wheel_r)
        } else {
            None
        };

        match wheel {
            Some(wheel) => {
                wheel.cmd = value;
                Ok(())
            }
            None => Err(HardwareError::UnknownInterface(format!(
                "{}/{}",
                prefix, interface
            ))),
        }
    }

    fn read(&mut self, _time: Instant, _period: Duration) -> Result<(), HardwareError> {
        self.ensure_connected()?;

        // Poll both wheels before touching state so a failed tick changes nothing
        let left = self.comms.get_telemetry(self.wheel_l.id)?;
        let right = self.comms.get_telemetry(self.wheel_r.id)?;

        self.wheel_l.apply_telemetry(left.angle, f64::from(left.velocity));
        self.wheel_r.apply_telemetry(right.angle, f64::from(right.velocity));

        debug!(
            "Read: left pos={:.3} vel={:.3}, right pos={:.3} vel={:.3}",
            self.wheel_l.pos, self.wheel_l.vel, self.wheel_r.pos, self.wheel_r.vel
        );
        Ok(())
    }

    fn write(&mut self, _time: Instant, _period: Duration) -> Result<(), HardwareError> {
        self.ensure_connected()?;
        let cfg = self.config.as_ref().ok_or(HardwareError::NotInitialized)?;

        // Right motor is mounted mirrored
        let left = self.wheel_l.cmd * cfg.velocity_gain;
        let right = -self.wheel_r.cmd * cfg.velocity_gain;

        self.comms.set_velocity(self.wheel_l.id, left, cfg.ramp)?;
        self.comms.set_velocity(self.wheel_r.id, right, cfg.ramp)?;
        Ok(())
    }
}

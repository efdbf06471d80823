// Transport seam between the hardware system and the motor bus

use std::time::Duration;
use tracing::{debug, info};

use super::ddsm115::{command_to_rpm, Ddsm115Bus, Ddsm115Error, DriveMode, Feedback};

/// Operations the hardware system needs from the motor bus
pub trait MotorTransport {
    fn connect(&mut self, device: &str, baud_rate: u32, timeout: Duration)
    -> Result<(), Ddsm115Error>;

    fn disconnect(&mut self);

    fn connected(&self) -> bool;

    fn set_mode(&mut self, id: u8, mode: DriveMode) -> Result<(), Ddsm115Error>;

    /// Poll one motor and keep the reply as the latest response
    fn get_telemetry(&mut self, id: u8) -> Result<Feedback, Ddsm115Error>;

    /// Send a velocity setpoint already scaled to device units
    fn set_velocity(&mut self, id: u8, value: f64, ramp: u8) -> Result<(), Ddsm115Error>;
}

/// Serial transport backed by a DDSM115 bus
#[derive(Default)]
pub struct Ddsm115Comms {
    bus: Option<Ddsm115Bus>,
    response: Option<Feedback>,
}

impl Ddsm115Comms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last telemetry snapshot, overwritten on every poll
    pub fn response(&self) -> Option<&Feedback> {
        self.response.as_ref()
    }

    fn bus(&mut self) -> Result<&mut Ddsm115Bus, Ddsm115Error> {
        self.bus.as_mut().ok_or(Ddsm115Error::NotConnected)
    }
}

impl MotorTransport for Ddsm115Comms {
    fn connect(
        &mut self,
        device: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<(), Ddsm115Error> {
        info!("Opening motor bus on {} at {} baud", device, baud_rate);
        self.bus = Some(Ddsm115Bus::open_with(device, baud_rate, timeout)?);
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.bus.take().is_some() {
            info!("Closed motor bus");
        }
        self.response = None;
    }

    fn connected(&self) -> bool {
        self.bus.is_some()
    }

    fn set_mode(&mut self, id: u8, mode: DriveMode) -> Result<(), Ddsm115Error> {
        self.bus()?.set_mode(id, mode)
    }

    fn get_telemetry(&mut self, id: u8) -> Result<Feedback, Ddsm115Error> {
        let feedback = self.bus()?.feedback(id)?;
        self.response = Some(feedback);
        Ok(feedback)
    }

    fn set_velocity(&mut self, id: u8, value: f64, ramp: u8) -> Result<(), Ddsm115Error> {
        let rpm = command_to_rpm(value);
        debug!("Velocity command motor {}: {} -> {} rpm", id, value, rpm);
        self.bus()?.drive(id, rpm, ramp)?;
        Ok(())
    }
}

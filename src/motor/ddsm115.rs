// DDSM115 hub motor serial protocol implementation
//
// Every frame on the RS485 bus is 10 bytes:
// [ID, Instruction, Data x7, CRC8]
// The CRC is CRC-8/MAXIM over the first nine bytes. The mode switch frame is
// the one exception: its last byte carries the mode instead of a checksum.

use serialport::{self, ClearBuffer, SerialPort};
use std::fmt;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, warn};

/// Default serial configuration for DDSM115 motors
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Fixed frame length for requests and replies
pub const FRAME_LEN: usize = 10;

/// Velocity loop limit in RPM
pub const MAX_RPM: i16 = 330;

/// Full scale of the 16-bit angle in drive replies (0..=32767 maps to 0..360 deg)
const ANGLE_SCALE_U16: f64 = 32767.0;

/// Full scale of the 8-bit angle in feedback replies
const ANGLE_SCALE_U8: f64 = 256.0;

/// Brake byte value in a drive frame
const BRAKE_ON: u8 = 0xFF;

/// Instruction set
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Drive = 0x64,
    Feedback = 0x74,
    SwitchMode = 0xA0,
}

/// Id query frames use a fixed leading byte instead of a motor id
const ID_QUERY_HEADER: u8 = 0xC8;

/// Device-side control loops
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveMode {
    Current = 0x01,
    Velocity = 0x02,
    Position = 0x03,
}

impl DriveMode {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0x01 => Some(Self::Current),
            0x02 => Some(Self::Velocity),
            0x03 => Some(Self::Position),
            _ => None,
        }
    }
}

/// Fault byte reported in every reply
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaultFlags(pub u8);

impl FaultFlags {
    pub const SENSOR: u8 = 0x01;
    pub const OVER_CURRENT: u8 = 0x02;
    pub const PHASE_OVER_CURRENT: u8 = 0x04;
    pub const STALL: u8 = 0x08;
    pub const TROUBLESHOOTING: u8 = 0x10;

    const NAMES: [(u8, &'static str); 5] = [
        (Self::SENSOR, "sensor"),
        (Self::OVER_CURRENT, "over-current"),
        (Self::PHASE_OVER_CURRENT, "phase over-current"),
        (Self::STALL, "stall"),
        (Self::TROUBLESHOOTING, "troubleshooting"),
    ];

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }
}

impl fmt::Display for FaultFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{} (0x{:02X})", names.join(", "), self.0)
    }
}

/// Telemetry decoded from a motor reply
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Feedback {
    pub id: u8,
    pub mode: u8,
    /// Raw torque current, -32767..=32767 maps to -8..8 A
    pub current: i16,
    /// Signed velocity in RPM
    pub velocity: i16,
    /// Rotor angle in degrees within one turn
    pub angle: f64,
    /// Winding temperature in deg C (feedback replies only)
    pub temperature: Option<u8>,
    pub faults: FaultFlags,
}

/// Error types for DDSM115 communication
#[derive(Debug, thiserror::Error)]
pub enum Ddsm115Error {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum mismatch for motor {id}")]
    ChecksumMismatch { id: u8 },

    #[error("Reply id mismatch: expected {expected}, got {got}")]
    IdMismatch { expected: u8, got: u8 },

    #[error("Timeout waiting for response from motor {id}")]
    Timeout { id: u8 },

    #[error("Motor bus is not connected")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, Ddsm115Error>;

/// CRC-8/MAXIM (reflected polynomial 0x31, init 0x00)
pub fn crc8_maxim(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x01 != 0 {
                crc = (crc >> 1) ^ 0x8C;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Build a checksummed frame
pub fn build_frame(head: u8, instruction: u8, data: [u8; 7]) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0] = head;
    frame[1] = instruction;
    frame[2..9].copy_from_slice(&data);
    frame[9] = crc8_maxim(&frame[..9]);
    frame
}

/// Drive frame: velocity in RPM, ramp in 0.1 ms per RPM
pub fn drive_frame(id: u8, rpm: i16, ramp: u8, brake: bool) -> [u8; FRAME_LEN] {
    let [hi, lo] = rpm.to_be_bytes();
    let brake = if brake { BRAKE_ON } else { 0 };
    build_frame(id, Instruction::Drive as u8, [hi, lo, 0, 0, ramp, brake, 0])
}

pub fn feedback_frame(id: u8) -> [u8; FRAME_LEN] {
    build_frame(id, Instruction::Feedback as u8, [0; 7])
}

/// Mode switch frame (no checksum, no reply)
pub fn mode_frame(id: u8, mode: DriveMode) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0] = id;
    frame[1] = Instruction::SwitchMode as u8;
    frame[9] = mode as u8;
    frame
}

pub fn id_query_frame() -> [u8; FRAME_LEN] {
    build_frame(ID_QUERY_HEADER, Instruction::Drive as u8, [0; 7])
}

/// Round a scaled command to whole RPM inside the velocity loop range
pub fn command_to_rpm(value: f64) -> i16 {
    value
        .round()
        .clamp(f64::from(-MAX_RPM), f64::from(MAX_RPM)) as i16
}

fn verify(frame: &[u8; FRAME_LEN]) -> Result<()> {
    if crc8_maxim(&frame[..9]) != frame[9] {
        return Err(Ddsm115Error::ChecksumMismatch { id: frame[0] });
    }
    Ok(())
}

/// Decode a reply to a drive or id query frame
///
/// Layout: [ID, mode, I_hi, I_lo, V_hi, V_lo, pos_hi, pos_lo, fault, CRC]
pub fn parse_drive_reply(frame: &[u8; FRAME_LEN]) -> Result<Feedback> {
    verify(frame)?;
    let position = u16::from_be_bytes([frame[6], frame[7]]);
    Ok(Feedback {
        id: frame[0],
        mode: frame[1],
        current: i16::from_be_bytes([frame[2], frame[3]]),
        velocity: i16::from_be_bytes([frame[4], frame[5]]),
        angle: f64::from(position) * 360.0 / ANGLE_SCALE_U16,
        temperature: None,
        faults: FaultFlags(frame[8]),
    })
}

/// Decode a reply to a feedback frame
///
/// Layout: [ID, mode, I_hi, I_lo, V_hi, V_lo, temp, pos_u8, fault, CRC]
pub fn parse_feedback_reply(frame: &[u8; FRAME_LEN]) -> Result<Feedback> {
    verify(frame)?;
    Ok(Feedback {
        id: frame[0],
        mode: frame[1],
        current: i16::from_be_bytes([frame[2], frame[3]]),
        velocity: i16::from_be_bytes([frame[4], frame[5]]),
        angle: f64::from(frame[7]) * 360.0 / ANGLE_SCALE_U8,
        temperature: Some(frame[6]),
        faults: FaultFlags(frame[8]),
    })
}

/// DDSM115 motor bus - handles serial communication with motors
pub struct Ddsm115Bus {
    port: Box<dyn SerialPort>,
}

impl Ddsm115Bus {
    /// Open a new connection to the motor bus
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with(
            port_name,
            DEFAULT_BAUDRATE,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }

    /// Open with custom baudrate and read timeout
    pub fn open_with(port_name: &str, baudrate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(timeout)
            .open()?;

        Ok(Self { port })
    }

    /// Send a frame, dropping any stale bytes still waiting in the input buffer
    fn send_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read one reply frame
    fn read_frame(&mut self, expected_id: u8) -> Result<[u8; FRAME_LEN]> {
        let mut frame = [0u8; FRAME_LEN];
        self.port.read_exact(&mut frame).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                Ddsm115Error::Timeout { id: expected_id }
            } else {
                Ddsm115Error::Io(e)
            }
        })?;
        Ok(frame)
    }

    fn check_id(expected: u8, feedback: &Feedback) -> Result<()> {
        if feedback.id != expected {
            return Err(Ddsm115Error::IdMismatch {
                expected,
                got: feedback.id,
            });
        }
        if !feedback.faults.is_empty() {
            warn!("Motor {} reports faults: {}", expected, feedback.faults);
        }
        Ok(())
    }

    /// Switch the device control loop
    pub fn set_mode(&mut self, id: u8, mode: DriveMode) -> Result<()> {
        debug!("Switch motor {} to {:?} mode", id, mode);
        self.send_frame(&mode_frame(id, mode))
    }

    /// Command a velocity in RPM and return the drive reply
    pub fn drive(&mut self, id: u8, rpm: i16, ramp: u8) -> Result<Feedback> {
        debug!("Drive motor {}: rpm={}, ramp={}", id, rpm, ramp);
        self.send_frame(&drive_frame(id, rpm, ramp, false))?;
        let feedback = parse_drive_reply(&self.read_frame(id)?)?;
        Self::check_id(id, &feedback)?;
        Ok(feedback)
    }

    /// Poll telemetry without changing the setpoint
    pub fn feedback(&mut self, id: u8) -> Result<Feedback> {
        self.send_frame(&feedback_frame(id))?;
        let feedback = parse_feedback_reply(&self.read_frame(id)?)?;
        Self::check_id(id, &feedback)?;
        Ok(feedback)
    }

    /// Ask the single motor on the bus for its id
    pub fn query_id(&mut self) -> Result<u8> {
        self.send_frame(&id_query_frame())?;
        let feedback = parse_drive_reply(&self.read_frame(ID_QUERY_HEADER)?)?;
        Ok(feedback.id)
    }

    /// Check if a motor answers a feedback request
    pub fn ping(&mut self, id: u8) -> Result<bool> {
        match self.feedback(id) {
            Ok(_) => Ok(true),
            Err(Ddsm115Error::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(bytes: [u8; 9]) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[..9].copy_from_slice(&bytes);
        frame[9] = crc8_maxim(&bytes);
        frame
    }

    #[test]
    fn test_crc8_maxim_check_value() {
        // Standard check input for CRC-8/MAXIM
        assert_eq!(crc8_maxim(b"123456789"), 0xA1);
        assert_eq!(crc8_maxim(&[]), 0x00);
    }

    #[test]
    fn test_drive_frame_layout() {
        let frame = drive_frame(1, -100, 3, false);
        assert_eq!(frame[0], 1);
        assert_eq!(frame[1], 0x64);
        // -100 as big-endian two's complement
        assert_eq!(&frame[2..4], &[0xFF, 0x9C]);
        assert_eq!(frame[6], 3);
        assert_eq!(frame[7], 0);
        assert_eq!(frame[9], crc8_maxim(&frame[..9]));

        let braking = drive_frame(2, 0, 0, true);
        assert_eq!(braking[7], 0xFF);
    }

    #[test]
    fn test_mode_frame_has_no_checksum() {
        let frame = mode_frame(2, DriveMode::Velocity);
        assert_eq!(frame, [2, 0xA0, 0, 0, 0, 0, 0, 0, 0, 0x02]);
    }

    #[test]
    fn test_feedback_and_id_query_frames() {
        let frame = feedback_frame(7);
        assert_eq!(&frame[..2], &[7, 0x74]);
        assert!(frame[2..9].iter().all(|&b| b == 0));
        assert_eq!(frame[9], crc8_maxim(&frame[..9]));

        let query = id_query_frame();
        assert_eq!(&query[..2], &[0xC8, 0x64]);
    }

    #[test]
    fn test_parse_drive_reply() {
        // velocity 50 rpm, angle half scale, current -1
        let frame = reply([1, 0x02, 0xFF, 0xFF, 0x00, 0x32, 0x40, 0x00, 0x00]);
        let fb = parse_drive_reply(&frame).unwrap();
        assert_eq!(fb.id, 1);
        assert_eq!(DriveMode::from_u8(fb.mode), Some(DriveMode::Velocity));
        assert_eq!(fb.current, -1);
        assert_eq!(fb.velocity, 50);
        assert!((fb.angle - 16384.0 * 360.0 / 32767.0).abs() < 1e-9);
        assert_eq!(fb.temperature, None);
        assert!(fb.faults.is_empty());
    }

    #[test]
    fn test_parse_feedback_reply() {
        // velocity -20 rpm, 31 deg C, quarter turn, stall flag
        let frame = reply([2, 0x02, 0x00, 0x10, 0xFF, 0xEC, 31, 64, 0x08]);
        let fb = parse_feedback_reply(&frame).unwrap();
        assert_eq!(fb.id, 2);
        assert_eq!(fb.velocity, -20);
        assert_eq!(fb.temperature, Some(31));
        assert!((fb.angle - 90.0).abs() < 1e-9);
        assert!(fb.faults.contains(FaultFlags::STALL));
        assert_eq!(fb.faults.to_string(), "stall (0x08)");
    }

    #[test]
    fn test_corrupted_reply_rejected() {
        let mut frame = reply([1, 0x02, 0, 0, 0, 0, 0, 0, 0]);
        frame[5] ^= 0x01;
        assert!(matches!(
            parse_feedback_reply(&frame),
            Err(Ddsm115Error::ChecksumMismatch { id: 1 })
        ));
    }

    #[test]
    fn test_command_to_rpm_rounds_and_clamps() {
        assert_eq!(command_to_rpm(12.4), 12);
        assert_eq!(command_to_rpm(-12.6), -13);
        assert_eq!(command_to_rpm(1000.0), MAX_RPM);
        assert_eq!(command_to_rpm(-1000.0), -MAX_RPM);
    }
}

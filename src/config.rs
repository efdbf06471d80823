// Timeouts, topics, default paths
use std::time::Duration;

// Control loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_BASE: &str = "diffbot/cmd/base"; // commands
pub const TOPIC_JOINT_STATES: &str = "diffbot/state/joints"; // wheel state
pub const TOPIC_HEALTH: &str = "diffbot/state/health"; // health status

// Hardware description loaded when none is given on the command line
pub const DEFAULT_DESCRIPTION: &str = "config/diffbot.json";

// Serial port for the DDSM115 RS485 adapter
pub const MOTOR_PORT: &str = "/dev/ttyUSB0";


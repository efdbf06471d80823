// Fixed-rate control loop with watchdog
// Each tick: drain body commands, convert them to wheel velocities, run the
// hardware read/write cycle, then publish joint states and health.
// The watchdog zeroes the wheels when commands stop arriving.

use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{error, info, warn};

// local imports
use crate::config::{
    CMD_TIMEOUT, DEFAULT_DESCRIPTION, LOOP_HZ, TOPIC_CMD_BASE, TOPIC_HEALTH, TOPIC_JOINT_STATES,
};
use crate::hardware::{
    DiffDriveDdsm115Hardware, HardwareComponent, HardwareConfig, HardwareInfo, ReturnType,
    SystemInterface,
};
use crate::messages::{BaseCommand, JointStates, RuntimeHealth};
use crate::motor::kinematics::{body_to_wheel_with_params, WHEEL_RADIUS, WHEEL_SEPARATION};
use crate::motor::WheelVelocities;

/// Command line options for the runtime
#[derive(Debug, Clone, Parser)]
#[command(about = "Differential drive runtime for a DDSM115 wheel pair")]
pub struct RuntimeOptions {
    /// Hardware description (JSON)
    #[arg(long, default_value = DEFAULT_DESCRIPTION)]
    pub description: PathBuf,

    /// Control loop rate in Hz
    #[arg(long, default_value_t = LOOP_HZ)]
    pub hz: u64,

    /// Wheel radius in meters
    #[arg(long, default_value_t = WHEEL_RADIUS)]
    pub wheel_radius: f64,

    /// Distance between the wheels in meters
    #[arg(long, default_value_t = WHEEL_SEPARATION)]
    pub wheel_separation: f64,

    /// Run the loop without opening the motor bus
    #[arg(long)]
    pub dry_run: bool,
}

pub struct Runtime {
    latest_cmd: Option<BaseCommand>,
    cmd_received_at: Instant,
    health: RuntimeHealth,
    wheel_radius: f64,
    wheel_separation: f64,
    max_wheel_vel: f64,
}

impl Runtime {
    /// `max_wheel_vel` is the largest joint command (rad/s) the hardware passes unclamped
    pub fn new(wheel_radius: f64, wheel_separation: f64, max_wheel_vel: f64) -> Self {
        Self {
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
            wheel_radius,
            wheel_separation,
            max_wheel_vel,
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Process incoming command
    pub fn on_command(&mut self, cmd: BaseCommand) {
        info!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = Instant::now();
    }

    /// Compute wheel velocities based on watchdog state
    pub fn compute_wheel_velocities(&mut self) -> WheelVelocities {
        let cmd_age = self.cmd_received_at.elapsed();

        if cmd_age > CMD_TIMEOUT {
            // Watchdog triggered - stop the robot
            if self.health != RuntimeHealth::CmdStale {
                warn!("Command stale ({:?} old), stopping robot", cmd_age);
            }
            self.health = RuntimeHealth::CmdStale;
            WheelVelocities::zero()
        } else if let Some(ref cmd) = self.latest_cmd {
            self.health = RuntimeHealth::Ok;
            body_to_wheel_with_params(
                cmd.x_vel,
                cmd.theta_vel,
                self.wheel_radius,
                self.wheel_separation,
                self.max_wheel_vel,
            )
        } else {
            // No command ever received
            self.health = RuntimeHealth::CmdStale;
            WheelVelocities::zero()
        }
    }
}

/// Bring the hardware up to active; in dry-run it stays unconfigured
fn start_hardware(
    info: &HardwareInfo,
    dry_run: bool,
) -> Result<HardwareComponent<DiffDriveDdsm115Hardware>, Box<dyn std::error::Error + Send + Sync>>
{
    let mut component = HardwareComponent::init(DiffDriveDdsm115Hardware::new(), info)?;
    if dry_run {
        info!("Dry run: motor bus stays closed");
        return Ok(component);
    }
    component.configure()?;
    component.activate()?;
    Ok(component)
}

pub async fn run(opts: RuntimeOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Loading hardware description from {}", opts.description.display());
    let hw_info = HardwareInfo::from_json_file(&opts.description)?;
    let mut component = start_hardware(&hw_info, opts.dry_run)?;

    let commands = component.system().export_command_interfaces();
    let [left_cmd, right_cmd] = <[_; 2]>::try_from(commands)
        .map_err(|_| "expected exactly two wheel command interfaces")?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_BASE).await?;
    let pub_joints = session.declare_publisher(TOPIC_JOINT_STATES).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let max_wheel_vel = component
        .system()
        .config()
        .map(HardwareConfig::max_command)
        .ok_or("hardware configuration missing after init")?;
    let mut runtime = Runtime::new(opts.wheel_radius, opts.wheel_separation, max_wheel_vel);
    let hz = opts.hz.clamp(1, 1000);
    let mut tick = interval(Duration::from_millis(1000 / hz));
    let mut last_tick = Instant::now();

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        hz,
        CMD_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_CMD_BASE);
    info!("Publishing to: {}, {}", TOPIC_JOINT_STATES, TOPIC_HEALTH);

    // One listener for the whole run so a signal during a tick is not lost
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = async {
        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = &mut ctrl_c => {
                    info!("Interrupted, shutting down");
                    return Ok::<(), Box<dyn std::error::Error + Send + Sync>>(());
                }
            }

            // 1. Drain all pending commands (non-blocking), keep latest
            while let Ok(Some(sample)) = subscriber.try_recv() {
                let payload = sample.payload().to_bytes();
                match serde_json::from_slice::<BaseCommand>(&payload) {
                    Ok(cmd) => runtime.on_command(cmd),
                    Err(e) => warn!("Failed to parse command: {}", e),
                }
            }

            // 2. Compute wheel velocities (includes watchdog logic)
            let wheels = runtime.compute_wheel_velocities();
            let system = component.system_mut();
            system.set_command(&left_cmd.prefix, &left_cmd.interface, wheels.left)?;
            system.set_command(&right_cmd.prefix, &right_cmd.interface, wheels.right)?;

            // 3. Hardware read/write cycle; serial I/O blocks up to the bus timeout
            let now = Instant::now();
            let period = now - last_tick;
            last_tick = now;
            let status = tokio::task::block_in_place(|| component.tick(now, period));

            // 4. Publish joint states and health
            let states = component.system().export_state_interfaces();
            let joints_json = serde_json::to_string(&JointStates::from(&states[..]))?;
            pub_joints.put(joints_json).await?;

            let health = match status {
                ReturnType::Ok => runtime.health(),
                ReturnType::Error => RuntimeHealth::HardwareError,
            };
            let health_json = serde_json::to_string(&health)?;
            pub_health.put(health_json).await?;
        }
    }
    .await;

    if let Err(e) = component.shutdown() {
        error!("Hardware shutdown failed: {}", e);
    }
    result
}

// Motor test: careful, step-by-step test of the full hardware cycle
//
// IMPORTANT: Run motor_diagnostic FIRST to verify read-only communication.
//
// Usage: cargo run --example motor_test -- [description.json]
// Example: cargo run --example motor_test -- config/diffbot.json
//
// Safety features:
// - Explicit confirmation before any writes
// - Starts with zero velocity
// - Very slow test speeds
// - Easy abort with Ctrl+C

use diffdrive_ddsm115::config::DEFAULT_DESCRIPTION;
use diffdrive_ddsm115::hardware::{
    DiffDriveDdsm115Hardware, HardwareComponent, HardwareInfo, ReturnType, SystemInterface,
    HW_IF_VELOCITY,
};
use diffdrive_ddsm115::motor::kinematics::body_to_wheel;
use diffdrive_ddsm115::motor::WheelVelocities;
use std::io::{self, Write};
use std::thread::sleep;
use std::time::{Duration, Instant};

const PERIOD: Duration = Duration::from_millis(20);

type Component = HardwareComponent<DiffDriveDdsm115Hardware>;

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    input.trim().eq_ignore_ascii_case("y")
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    println!("DDSM115 Motor Test (WITH WRITES)");
    println!("  ⚠  This tool WILL write to motors and cause movement!");
    println!("  ⚠  Make sure wheels are OFF THE GROUND before proceeding!");
    println!();
    println!("Hardware description: {}", path);
    println!();

    if !confirm("Have you run motor_diagnostic first and verified both motors respond?") {
        println!("Please run: cargo run --example motor_diagnostic");
        return Ok(());
    }

    if !confirm("Are the robot's wheels OFF THE GROUND (robot elevated/on blocks)?") {
        println!("Please elevate the robot so wheels can spin freely without moving the robot.");
        return Ok(());
    }

    let info = HardwareInfo::from_json_file(&path)?;
    let mut component = HardwareComponent::init(DiffDriveDdsm115Hardware::new(), &info)?;

    // ========== STEP 1: Open the bus ==========
    println!();
    println!("Step 1: Configuring (opening the motor bus)...");
    component.configure()?;
    println!("  ✓ Connected");
    println!();

    // ========== STEP 2: Velocity loop ==========
    println!("Step 2: Activating (switching both motors to velocity loop)...");
    if !confirm("Proceed with activation?") {
        component.shutdown()?;
        return Ok(());
    }
    component.activate()?;
    println!("  ✓ Velocity loop set");
    println!();

    // ========== STEP 3: Zero velocity ==========
    println!("Step 3: Sending ZERO velocity for 0.5 s (no movement expected)...");
    if !confirm("Send zero velocity command?") {
        component.shutdown()?;
        return Ok(());
    }
    run_for(&mut component, WheelVelocities::zero(), Duration::from_millis(500))?;
    print_state(&component);
    println!();

    // ========== STEP 4: Slow motion ==========
    println!("Step 4: Very slow motion test (0.3 s per step)");
    println!("  ⚠  WATCH THE WHEELS - they should spin slowly!");
    println!();
    if !confirm("Proceed with motion test?") {
        stop(&mut component)?;
        component.shutdown()?;
        return Ok(());
    }

    let test_velocity = 0.02; // m/s
    let tests = [
        ("Forward", test_velocity, 0.0),
        ("Backward", -test_velocity, 0.0),
        ("Rotate CCW", 0.0, 0.3), // rad/s
        ("Rotate CW", 0.0, -0.3),
    ];

    for (name, x, theta) in tests {
        println!("  Testing: {}...", name);
        let wheels = body_to_wheel(x, theta);
        println!(
            "    Wheel commands: left={:.3} rad/s, right={:.3} rad/s",
            wheels.left, wheels.right
        );
        run_for(&mut component, wheels, Duration::from_millis(300))?;
        print_state(&component);
        stop(&mut component)?;
        sleep(Duration::from_millis(500));
    }

    // ========== FINAL: Stop and cleanup ==========
    println!();
    println!("Step 5: Stopping motors and closing the bus...");
    stop(&mut component)?;
    component.shutdown()?;
    println!("  ✓ Done");
    println!();
    println!("If the wheels moved as expected, the hardware cycle is working.");
    println!("You can now try the full runtime with: cargo run");

    Ok(())
}

/// Hold a wheel command for `duration`, ticking at the control rate
fn run_for(
    component: &mut Component,
    wheels: WheelVelocities,
    duration: Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let commands = component.system().export_command_interfaces();
    for (slot, value) in commands.iter().zip(wheels.as_array()) {
        component
            .system_mut()
            .set_command(&slot.prefix, HW_IF_VELOCITY, value)?;
    }

    let start = Instant::now();
    while start.elapsed() < duration {
        if component.tick(Instant::now(), PERIOD) == ReturnType::Error {
            return Err("hardware tick failed".into());
        }
        sleep(PERIOD);
    }
    Ok(())
}

fn stop(component: &mut Component) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    run_for(component, WheelVelocities::zero(), PERIOD)
}

fn print_state(component: &Component) {
    for state in component.system().export_state_interfaces() {
        println!("    {:<28} {:9.4}", state.name(), state.value);
    }
}

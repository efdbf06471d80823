// Motor diagnostic: READ-ONLY test to verify the wheel pair answers
//
// Only feedback frames are sent; setpoints and modes are left untouched.
// Run this first before motor_test.
//
// Usage: cargo run --example motor_diagnostic -- [port] [--query-id]
// Example: cargo run --example motor_diagnostic -- /dev/ttyUSB0
//
// --query-id asks the motor for its id; only valid with ONE motor on the bus.

use diffdrive_ddsm115::config::MOTOR_PORT;
use diffdrive_ddsm115::motor::ddsm115::{Ddsm115Bus, DriveMode};
use diffdrive_ddsm115::motor::{degrees_to_radians, rpm_to_rad_per_sec};
use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

const MOTOR_IDS: [u8; 2] = [1, 2];
const MOTOR_NAMES: [&str; 2] = ["Left", "Right"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query_id = args.iter().any(|a| a == "--query-id");
    let port = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| MOTOR_PORT.to_string());

    println!("DDSM115 Motor Diagnostic (READ-ONLY)");
    println!("Serial port: {}", port);
    println!("Expected motor IDs: {:?}", MOTOR_IDS);
    println!();

    println!("Step 1: Opening serial port...");
    let mut bus = match Ddsm115Bus::open(&port) {
        Ok(bus) => {
            println!("  ✓ Serial port opened successfully");
            bus
        }
        Err(e) => {
            println!("  ✗ Failed to open serial port: {}", e);
            println!();
            println!("Troubleshooting:");
            println!("  - Check the port path is correct");
            println!("  - Verify the RS485 adapter is connected and powered");
            println!("  - On Linux, check the user is in the dialout group");
            return Err(e.into());
        }
    };
    println!();

    if query_id {
        println!("Querying id of the single motor on the bus...");
        match bus.query_id() {
            Ok(id) => println!("  ✓ Motor answers with ID {}", id),
            Err(e) => println!("  ✗ ERROR: {}", e),
        }
        return Ok(());
    }

    println!("Step 2: Pinging motors...");
    let mut all_found = true;
    for (i, &id) in MOTOR_IDS.iter().enumerate() {
        print!("  Motor {} (ID {}): ", MOTOR_NAMES[i], id);
        io::stdout().flush()?;

        match bus.ping(id) {
            Ok(true) => println!("✓ RESPONDING"),
            Ok(false) => {
                println!("✗ NO RESPONSE");
                all_found = false;
            }
            Err(e) => {
                println!("✗ ERROR: {}", e);
                all_found = false;
            }
        }
    }
    println!();

    if !all_found {
        println!("⚠ WARNING: Not all motors responded!");
        println!("  - Check the ids with a single motor on the bus (id query)");
        println!("  - Check the RS485 A/B wiring");
        println!();
    }

    println!("Step 3: Reading telemetry (5 samples)...");
    for _ in 0..5 {
        for (i, &id) in MOTOR_IDS.iter().enumerate() {
            match bus.feedback(id) {
                Ok(fb) => {
                    let mode = DriveMode::from_u8(fb.mode)
                        .map(|m| format!("{:?}", m))
                        .unwrap_or_else(|| format!("0x{:02X}", fb.mode));
                    println!(
                        "  {:<5} mode={:<8} angle={:7.2}° ({:.3} rad) vel={:4} rpm ({:.3} rad/s) temp={:?}°C faults={}",
                        MOTOR_NAMES[i],
                        mode,
                        fb.angle,
                        degrees_to_radians(fb.angle),
                        fb.velocity,
                        rpm_to_rad_per_sec(f64::from(fb.velocity)),
                        fb.temperature,
                        fb.faults
                    );
                }
                Err(e) => println!("  {:<5} ✗ {}", MOTOR_NAMES[i], e),
            }
        }
        sleep(Duration::from_millis(200));
    }
    println!();

    if all_found {
        println!("✓ Diagnostic complete. Motors are ready for motor_test.");
    }
    Ok(())
}

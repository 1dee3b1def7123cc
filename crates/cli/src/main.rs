//! open-joystick CLI: command-line joystick and gamepad inspection tool.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use open_joystick_core::{JoystickSession, SystemBackend};

#[derive(Parser)]
#[command(
    name = "open-joystick",
    version,
    about = "Joystick and gamepad HID inspection"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached game controllers.
    List {
        /// Emit machine-readable JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Show classified element counts for a device.
    Capabilities {
        /// Device location key; defaults to the first attached controller.
        #[arg(long)]
        device: Option<i32>,
        /// Emit machine-readable JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Poll axes, buttons and POV hats.
    Poll {
        /// Device location key; defaults to the first attached controller.
        #[arg(long)]
        device: Option<i32>,
        /// Delay between samples in milliseconds.
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// Number of samples to take; 0 polls until interrupted.
        #[arg(long, default_value_t = 0)]
        count: u64,
    },
    /// Dump every HID element the device exposes.
    Dump {
        /// Device location key; defaults to the first attached controller.
        #[arg(long)]
        device: Option<i32>,
        /// Write the dump to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Ramp every output to full scale and back down.
    OutputTest {
        /// Device location key; defaults to the first attached controller.
        #[arg(long)]
        device: Option<i32>,
        /// Ramp steps in each direction.
        #[arg(long, default_value_t = 64)]
        steps: u32,
    },
}

/// Initialise the session on `device`, or on the first attached controller
/// when no key is given.
fn initialise_device(
    session: &mut JoystickSession<SystemBackend>,
    device: Option<i32>,
) -> Result<i32> {
    let location_key = match device {
        Some(key) => key,
        None => {
            let devices = session.available_devices()?;
            devices
                .first()
                .map(|d| d.location_key)
                .ok_or_else(|| anyhow::anyhow!("No game controllers found"))?
        }
    };
    if !session.initialise(location_key) {
        anyhow::bail!(
            "Could not initialise device at location key {location_key}; \
             run `open-joystick list` to see attached controllers"
        );
    }
    Ok(location_key)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut session = JoystickSession::new(SystemBackend::new());

    match cli.command {
        Commands::List { json } => {
            let devices = session.available_devices()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else if devices.is_empty() {
                println!("No game controllers found.");
            } else {
                for dev in &devices {
                    println!("{} (location key: {})", dev.product_name, dev.location_key);
                }
            }
        }
        Commands::Capabilities { device, json } => {
            initialise_device(&mut session, device)?;
            let caps = session.io_capabilities();
            if json {
                let value = serde_json::json!({
                    "device": session.selected_descriptor(),
                    "capabilities": caps,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                if let Some(dev) = session.selected_descriptor() {
                    println!("{} (location key: {})", dev.product_name, dev.location_key);
                }
                println!("  axes:    {}", caps.axes);
                println!("  buttons: {}", caps.buttons);
                println!("  povs:    {}", caps.povs);
                println!("  outputs: {}", caps.outputs);
            }
        }
        Commands::Poll {
            device,
            interval_ms,
            count,
        } => {
            initialise_device(&mut session, device)?;
            if let Some(dev) = session.selected_descriptor() {
                println!("Polling {} (location key: {})", dev.product_name, dev.location_key);
            }
            let mut remaining = count;
            loop {
                let axes = session.poll_axes()?;
                let buttons = session.poll_buttons()?;
                let povs = session.poll_povs()?;

                let axes: Vec<String> = axes.iter().map(|v| format!("{v:+.3}")).collect();
                let buttons: String =
                    buttons.iter().map(|b| if *b { '1' } else { '0' }).collect();
                let povs: Vec<String> = povs.iter().map(|v| format!("{v:.0}")).collect();
                println!(
                    "axes [{}]  buttons [{}]  povs [{}]",
                    axes.join(" "),
                    buttons,
                    povs.join(" ")
                );

                if count != 0 {
                    remaining -= 1;
                    if remaining == 0 {
                        break;
                    }
                }
                thread::sleep(Duration::from_millis(interval_ms));
            }
        }
        Commands::Dump { device, output } => {
            initialise_device(&mut session, device)?;
            match output {
                Some(path) => {
                    let mut file = File::create(&path)?;
                    session.dump_elements(&mut file)?;
                    println!("Dump written to {}", path.display());
                }
                None => {
                    session.dump_elements(&mut io::stdout().lock())?;
                }
            }
        }
        Commands::OutputTest { device, steps } => {
            if steps == 0 {
                anyhow::bail!("steps must be at least 1");
            }
            initialise_device(&mut session, device)?;
            let outputs = session.io_capabilities().outputs as usize;
            if outputs == 0 {
                println!("Device has no output elements.");
                return Ok(());
            }
            println!("Ramping {outputs} output(s) over {steps} steps each way");
            for step in (0..=steps).chain((0..steps).rev()) {
                let level = f64::from(step) / f64::from(steps);
                session.push_outputs(&vec![level; outputs])?;
                thread::sleep(Duration::from_millis(10));
            }
            println!("Done.");
        }
    }

    Ok(())
}

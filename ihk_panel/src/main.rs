//! # IHK Panel Binary
//!
//! Runs the operator-panel bridge against the simulated controller.
//!
//! # Usage
//!
//! ```bash
//! # Default configuration
//! ihk_panel --config-dir config/
//!
//! # Drive the conveyor right for 20 ticks with debug output
//! ihk_panel --config-dir config/ --output Q1 --ticks 20 -v
//!
//! # JSON logs
//! ihk_panel --config-dir config/ --json
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use ihk_common::config::{LogLevel, load_config_dir};
use ihk_common::consts::DEFAULT_CONFIG_PATH;
use ihk_common::io::signal::{SignalId, SignalType};
use ihk_panel::{Bridge, BridgeError, SimulatedController, TickOutcome};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// IHK Panel - operator panel I/O bridge with position simulation
#[derive(Parser, Debug)]
#[command(name = "ihk_panel")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Operator panel I/O bridge with interlocks and position simulation")]
#[command(long_about = None)]
struct Args {
    /// Configuration directory (panel.toml + optional io.toml)
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CONFIG_PATH)]
    config_dir: PathBuf,

    /// Stop after this many ticks (runs until Ctrl-C if omitted)
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    /// Pre-set a controller output by tag (can be specified multiple times)
    #[arg(long = "output", value_name = "TAG", action = clap::ArgAction::Append)]
    outputs: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Panel bridge failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config_dir(&args.config_dir);
    let level = loaded
        .as_ref()
        .map_or(LogLevel::Info, |c| c.panel.shared.log_level);
    setup_tracing(&args, level);
    let loaded = loaded?;

    info!(
        "{} v{} starting (config {})",
        loaded.panel.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        args.config_dir.display()
    );

    let mut controller = SimulatedController::new();
    for tag in &args.outputs {
        let id: SignalId = tag.parse()?;
        if id.expected_type() != SignalType::Do {
            return Err(format!("{tag} is not a controller output").into());
        }
        controller.set_output(&loaded.map, id, true)?;
        info!("Output {} ({}) held on", id, loaded.map.signal(id).name);
    }

    let mut bridge = Bridge::new(controller, loaded.map, &loaded.panel)?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(false, Ordering::SeqCst);
    })?;

    bridge.attach()?;
    if let Err(e) = run_cycle(&mut bridge, &running, args.ticks) {
        error!("Polling cycle failed: {}", e);
    }
    bridge.shutdown();

    let stats = bridge.stats();
    info!(
        "Shutdown complete: {} ticks, {} publications, final position {}",
        stats.ticks,
        stats.publications,
        bridge.position()
    );
    Ok(())
}

/// Tick at the configured period until stopped, failed or out of ticks.
fn run_cycle(
    bridge: &mut Bridge<SimulatedController>,
    running: &AtomicBool,
    limit: Option<u64>,
) -> Result<(), BridgeError> {
    let mut last = bridge.display();
    let mut count = 0u64;

    while running.load(Ordering::SeqCst) && limit.is_none_or(|n| count < n) {
        match bridge.tick()? {
            TickOutcome::Completed(snapshot) => {
                if snapshot != last {
                    info!(
                        "position={} feedback={} motor={:?} cylinders={:?} reset={:?}",
                        snapshot.position,
                        snapshot.feedback,
                        snapshot.motor,
                        snapshot.cylinders,
                        snapshot.reset_lamp
                    );
                    last = snapshot;
                }
            }
            TickOutcome::Skipped(state) => {
                warn!("Polling cycle {}, leaving", state);
                break;
            }
        }
        count += 1;
        std::thread::sleep(bridge.period());
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(directive.parse().unwrap_or_else(|_| tracing::Level::INFO.into()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

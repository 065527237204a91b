//! # PIXELSNAP Headless Simulation
//!
//! Runs the frame driver, follow camera and a crowd of movers without a
//! window, then logs frame statistics.
//!
//! ## Usage
//!
//! ```bash
//! pixelsnap_sim --config sim.toml --frames 1200 --movers 2000
//! RUST_LOG=pixelsnap=debug pixelsnap_sim
//! ```

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use pixelsnap::{SimConfig, Simulation};

fn print_usage() {
    println!("Usage: pixelsnap_sim [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>     TOML simulation config");
    println!("  -f, --frames <NUM>      Frames to run (overrides config)");
    println!("  -m, --movers <NUM>      Oscillating entities (overrides config)");
    println!("      --timing-logs       Warn about frames over budget");
    println!("  -h, --help              Show this help");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut frames: Option<u32> = None;
    let mut movers: Option<usize> = None;
    let mut timing_logs = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--frames" | "-f" => {
                if i + 1 < args.len() {
                    frames = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--movers" | "-m" => {
                if i + 1 < args.len() {
                    movers = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--timing-logs" => timing_logs = true,
            "--help" | "-h" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            other => tracing::warn!(argument = other, "ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => match SimConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(%err, "failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };
    if let Some(frames) = frames {
        config.frames = frames;
    }
    if let Some(movers) = movers {
        config.movers = movers;
        config.snap.capacity = config.snap.capacity.max(movers + 2);
    }

    let mut simulation = match Simulation::new(config) {
        Ok(simulation) => simulation,
        Err(err) => {
            tracing::error!(%err, "failed to build simulation");
            return ExitCode::FAILURE;
        }
    };
    if timing_logs {
        simulation.set_timing_logs(true);
    }

    match simulation.run() {
        Ok(stats) => {
            stats.log_summary();
            let target = simulation.target();
            tracing::info!(
                real = ?target.real_position(),
                snapped = ?target.transform().position,
                offset = ?simulation.rig().viewport_offset(),
                "final target state"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, frame = simulation.driver().frame_count(), "simulation stopped");
            ExitCode::FAILURE
        }
    }
}

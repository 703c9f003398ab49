//! `stagetrack` – stage tracker command line entry point.
//!
//! 1. Initialises logging (and OTLP span export when configured).
//! 2. Loads `~/.stagetrack/config.toml`, writing the defaults on first run.
//! 3. Validates the configuration before any scan is processed.
//! 4. Runs the tracker loop on a single-threaded runtime until the scan
//!    source ends or **Ctrl-C** raises the stop flag.

mod config;

use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use stagetrack_hal::{ReplaySource, ScanSource, SimLidar};
use stagetrack_middleware::UdpPublisher;
use stagetrack_runtime::{RunStats, TrackerLoop, TrackingSession, init_tracing};
use stagetrack_types::TrackError;

use config::{Config, SourceKind};

fn main() -> ExitCode {
    let _telemetry = init_tracing("stagetrack");

    print_banner();

    // ── Stop flag ─────────────────────────────────────────────────────────
    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after the current scan …".yellow().bold());
        stop_handler.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; stop the tracker by ending its scan source");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = cfg.validate() {
        eprintln!("{}: {}", "Invalid configuration".red().bold(), e);
        return ExitCode::FAILURE;
    }
    print_summary(&cfg);

    // ── Tracking ──────────────────────────────────────────────────────────
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start runtime".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cfg, stop)) {
        Ok(stats) => {
            info!(
                scans = stats.scans,
                detections = stats.detections,
                emissions = stats.emissions,
                publish_failures = stats.publish_failures,
                "session ended"
            );
            println!(
                "\n  {} {} scans, {} detections, {} positions sent",
                "✓".green().bold(),
                stats.scans,
                stats.detections,
                stats.emissions
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "session aborted");
            eprintln!("{}: {}", "Tracking stopped".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: Config, stop: Arc<AtomicBool>) -> Result<RunStats, TrackError> {
    let session = TrackingSession::new(cfg.tracker_params())?;
    let publisher =
        UdpPublisher::resolve(&cfg.network.target_host, cfg.network.target_port).await?;
    let mut source = open_source(&cfg).await?;

    let mut tracker = TrackerLoop::new(session, stop);
    tracker.run(source.as_mut(), &publisher).await
}

async fn open_source(cfg: &Config) -> Result<Box<dyn ScanSource>, TrackError> {
    let lidar = &cfg.lidar;
    match lidar.source {
        SourceKind::Sim => Ok(Box::new(
            SimLidar::new("sim-lidar")
                .with_resolution(lidar.angular_resolution_deg)
                .with_scan_rate(lidar.scan_rate_hz),
        )),
        SourceKind::Replay => {
            let path = lidar.replay_path.as_ref().ok_or_else(|| {
                TrackError::InvalidConfig("lidar.replay_path is not set".into())
            })?;
            let replay = ReplaySource::open(path)
                .await?
                .with_scan_rate(lidar.scan_rate_hz)
                .with_looping(lidar.replay_loop);
            Ok(Box::new(replay))
        }
    }
}

/// Load the config file, or write the defaults to it when absent.
fn load_config() -> Result<Config, String> {
    if let Some(cfg) = config::load()? {
        println!(
            "  Config loaded from {}",
            config::config_path().display().to_string().bold()
        );
        return Ok(cfg);
    }

    let mut cfg = Config::default();
    match config::save(&cfg) {
        Ok(()) => println!(
            "  {} Default config written to {}",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => warn!(error = %e, "could not write default config; continuing with defaults"),
    }
    config::apply_env_overrides(&mut cfg);
    Ok(cfg)
}

// ─────────────────────────────────────────────────────────────────────────────
// Console output
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   _____ __                  ______                __  "#.bold().cyan());
    println!("{}", r#"  / ___// /_____ _____ ____/_  __/________ ______/ /__"#.bold().cyan());
    println!("{}", r#"  \__ \/ __/ __ `/ __ `/ _ \/ / / ___/ __ `/ ___/ //_/"#.bold().cyan());
    println!("{}", r#" ___/ / /_/ /_/ / /_/ /  __/ / / /  / /_/ / /__/ ,<   "#.bold().cyan());
    println!("{}", r#"/____/\__/\__,_/\__, /\___/_/ /_/   \__,_/\___/_/|_|  "#.bold().cyan());
    println!("{}", r#"               /____/                                  "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "StageTrack".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  LiDAR single-performer stage tracker");
    println!();
}

fn print_summary(cfg: &Config) {
    let source = match (&cfg.lidar.source, &cfg.lidar.replay_path) {
        (SourceKind::Replay, Some(path)) => format!("replay {}", path.display()),
        (kind, _) => kind.to_string(),
    };
    println!(
        "  Stage      {} × {} m",
        cfg.stage.width_m, cfg.stage.height_m
    );
    println!("  Source     {}", source.bold());
    println!(
        "  Sending to {}",
        format!("udp://{}:{}", cfg.network.target_host, cfg.network.target_port).bold()
    );
    println!("  Press {} to stop.\n", "Ctrl-C".bold().cyan());
}

use bevy::prelude::*;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wayfarer::{Location, NavConfig, NavWorld, RoutePlan};

/// Plan a route through a world file.
#[derive(Parser, Debug)]
#[command(name = "wayfarer", version, about)]
struct Args {
    /// World description (.ron) or compressed snapshot
    #[arg(long)]
    world: PathBuf,

    /// Navigation config (.ron); defaults apply when missing
    #[arg(long, default_value = "assets/nav_config.ron")]
    config: PathBuf,

    /// Start location
    #[arg(long, num_args = 3, value_names = ["REGION", "X", "Y"], required = true, allow_negative_numbers = true)]
    from: Vec<String>,

    /// Goal location
    #[arg(long, num_args = 3, value_names = ["REGION", "X", "Y"], required = true, allow_negative_numbers = true)]
    to: Vec<String>,

    /// Print the plan as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Skip the log file under logs/
    #[arg(long)]
    no_log_file: bool,
}

fn setup_logging(write_file: bool) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wayfarer=info"));

    // Console output goes to stderr so stdout stays clean for --json
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let log_dir = PathBuf::from("logs");
    let file = if write_file && fs::create_dir_all(&log_dir).is_ok() {
        cleanup_old_logs(&log_dir, 25);

        let now = chrono::Local::now();
        let log_filename = format!("wayfarer_{}.log", now.format("%Y%m%d_%H%M%S"));
        let appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);
        Some((log_dir.join(&log_filename), appender))
    } else {
        None
    };

    let (path, file_layer) = match file {
        Some((path, appender)) => (
            Some(path),
            Some(fmt::layer().with_writer(appender).with_ansi(false)),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    path
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("wayfarer") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Oldest first
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

fn parse_location(parts: &[String]) -> Result<Location, String> {
    let [region, x, y] = parts else {
        return Err(format!("expected REGION X Y, got {} values", parts.len()));
    };
    let x: f32 = x.parse().map_err(|_| format!("`{}` is not a number", x))?;
    let y: f32 = y.parse().map_err(|_| format!("`{}` is not a number", y))?;
    Ok(Location::new(region.as_str(), x, y))
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(log_file) = setup_logging(!args.no_log_file) {
        info!("[CLI] Logging to {}", log_file.display());
    }

    let (start, goal) = match (parse_location(&args.from), parse_location(&args.to)) {
        (Ok(start), Ok(goal)) => (start, goal),
        (Err(e), _) | (_, Err(e)) => {
            error!("[CLI] Invalid location: {}", e);
            return ExitCode::from(2);
        }
    };

    let config = NavConfig::load(&args.config);
    let world = match NavWorld::load(&args.world, config) {
        Ok(world) => world,
        Err(e) => {
            error!("[CLI] Failed to load world {}: {}", args.world.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let plan = match world.plan(&start, &goal) {
        Ok(plan) => plan,
        Err(e) => {
            error!("[CLI] {}", e);
            return ExitCode::from(2);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&plan) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("[CLI] Failed to encode plan: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    match plan {
        RoutePlan::AlreadyThere => println!("{} -> {}: already there", start, goal),
        RoutePlan::Unreachable => println!("{} -> {}: no route", start, goal),
        RoutePlan::Found(route) => {
            println!("{} -> {}", start, goal);
            println!("{}", route);
        }
    }

    ExitCode::SUCCESS
}

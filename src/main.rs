use std::path::PathBuf;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use swerve_zenoh_runtime::config::DriveConfig;

#[derive(Parser, Debug)]
#[command(about = "Swerve drive control runtime")]
struct Args {
    /// JSON drive configuration (built-in robot constants when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drive robot-relative even if the configuration says field oriented
    #[arg(long)]
    robot_relative: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();

    let mut config = match args.config {
        Some(path) => match DriveConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("Config error: {}", e);
                std::process::exit(1);
            }
        },
        None => DriveConfig::default(),
    };
    if args.robot_relative {
        config.field_oriented = false;
    }

    if let Err(e) = swerve_zenoh_runtime::runtime::run(config).await {
        error!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

//! show_config - resolve and print the detection service configuration
//!
//! Resolves settings exactly as the service does at startup (defaults, the
//! optional STATION_VISION_CONFIG file, then PORT / MODEL_PATH) and prints
//! them as JSON. Exits non-zero when resolution fails.

use anyhow::Result;
use clap::Parser;

use station_vision::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "show_config",
    about = "Print the resolved detection service configuration"
)]
struct Args {
    /// Print single-line JSON
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = AppConfig::load()?;
    log::info!("serving on {}", cfg.bind_addr());
    if !cfg.model_path().exists() {
        log::warn!("model file {} does not exist yet", cfg.model_path().display());
    }

    let json = if args.compact {
        serde_json::to_string(&cfg)?
    } else {
        serde_json::to_string_pretty(&cfg)?
    };
    println!("{json}");
    Ok(())
}

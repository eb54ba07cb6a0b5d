//! plot_scores - bar chart of per-class mAP50 scores
//!
//! Renders the mission baseline scores, or a JSON score file, as a
//! colour-mapped bar chart and writes it as PNG or JPEG (chosen by the
//! output extension).

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use station_vision::chart::{self, ChartLayout, ChartStyle};
use station_vision::codec::{self, ImageEncoding};
use station_vision::config::ImageSettings;
use station_vision::ScoreTable;

#[derive(Parser, Debug)]
#[command(
    name = "plot_scores",
    about = "Render per-class accuracy scores as a bar chart"
)]
struct Args {
    /// JSON file with [{"class": ..., "score": ...}]; defaults to the mission baseline
    #[arg(long, value_name = "PATH")]
    scores: Option<PathBuf>,

    /// Output image (.png or .jpg)
    #[arg(long, default_value = "class_scores.png", value_name = "PATH")]
    out: PathBuf,

    /// Chart title
    #[arg(long)]
    title: Option<String>,

    /// Image width in pixels
    #[arg(long, default_value_t = 1000)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// TrueType font for labels; a system font is used when omitted
    #[arg(long, env = "STATION_VISION_FONT", value_name = "PATH")]
    font: Option<PathBuf>,

    /// JPEG quality (0-100)
    #[arg(long, default_value_t = 90)]
    quality: u8,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.quality > 100 {
        return Err(anyhow!("--quality must be between 0 and 100"));
    }

    let table = match &args.scores {
        Some(path) => ScoreTable::load_json(path)?,
        None => ScoreTable::mission_baseline(),
    };
    let mut style = ChartStyle {
        width: args.width,
        height: args.height,
        ..ChartStyle::default()
    };
    if let Some(title) = args.title {
        style.title = title;
    }

    let layout = ChartLayout::compute(&table, &style)?;
    let font = chart::load_font(args.font.as_deref())?;
    let img = chart::render(&layout, font.as_ref());

    let settings = ImageSettings {
        encoding: ImageEncoding::from_path(&args.out)?,
        quality: args.quality,
    };
    codec::write(&img, &settings, &args.out)?;

    for bar in &layout.bars {
        log::debug!("{:<20} {}", bar.class, bar.label);
    }
    log::info!(
        "wrote {} classes (best {:.2}) to {}",
        table.len(),
        table.max_score(),
        args.out.display()
    );
    Ok(())
}

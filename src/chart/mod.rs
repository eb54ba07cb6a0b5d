//! Bar chart of per-class accuracy scores.
//!
//! Charting is split in two steps:
//! - [`ChartLayout::compute`] turns a [`ScoreTable`] into pixel geometry,
//!   colours and label text. It is pure and carries everything the
//!   rasteriser needs.
//! - [`render::render`] rasterises a layout into an `RgbImage`.
//!
//! The vertical axis is fixed to `[0, 1]`. Bar colours are sampled from
//! viridis relative to the best score, so the best class is always drawn in
//! the top colour of the scale.

pub mod colormap;
pub mod font;
pub mod render;

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};

use crate::scores::ScoreTable;

pub use colormap::{viridis, VIRIDIS_MAX, VIRIDIS_MIN};
pub use font::load_font;
pub use render::render;

pub const Y_RANGE: (f32, f32) = (0.0, 1.0);
const GRID_STEP: f32 = 0.2;
const MIN_WIDTH: u32 = 200;
const MIN_HEIGHT: u32 = 150;

/// Presentation settings for a score chart.
#[derive(Clone, Debug)]
pub struct ChartStyle {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    /// Fraction of a category slot covered by its bar.
    pub bar_width: f32,
    /// Counter-clockwise rotation of class names, in degrees.
    pub tick_rotation_deg: f32,
    /// Gap between a bar top and its value label, in data units.
    pub label_offset: f32,
    pub grid_alpha: f32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            title: "My Model Accuracy (mAP @ 50%)".to_string(),
            x_label: "Object Class".to_string(),
            y_label: "Accuracy Score (0-1)".to_string(),
            width: 1000,
            height: 600,
            bar_width: 0.6,
            tick_rotation_deg: 25.0,
            label_offset: 0.01,
            grid_alpha: 0.4,
        }
    }
}

/// Plot area in pixels. `top < bottom`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotArea {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PlotArea {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Pixel row for a value on the fixed `[0, 1]` axis.
    pub fn y_for(&self, value: f32) -> f32 {
        let (lo, hi) = Y_RANGE;
        self.bottom - (value - lo) / (hi - lo) * self.height()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub class: String,
    pub score: f32,
    /// Score formatted to two decimals.
    pub label: String,
    pub color: Rgb<u8>,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    /// Bottom-centre point of the value label.
    pub label_anchor: (f32, f32),
    /// Right end of the rotated class name.
    pub tick_anchor: (f32, f32),
}

impl Bar {
    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridLine {
    pub value: f32,
    pub y: f32,
    pub label: String,
}

/// Geometry and text for one chart, in pixel space.
#[derive(Clone, Debug)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    pub plot: PlotArea,
    pub bars: Vec<Bar>,
    pub gridlines: Vec<GridLine>,
    pub style: ChartStyle,
}

impl ChartLayout {
    pub fn compute(table: &ScoreTable, style: &ChartStyle) -> Result<Self> {
        if style.width < MIN_WIDTH || style.height < MIN_HEIGHT {
            return Err(anyhow!(
                "chart must be at least {}x{} pixels, got {}x{}",
                MIN_WIDTH,
                MIN_HEIGHT,
                style.width,
                style.height
            ));
        }
        if !(style.bar_width > 0.0 && style.bar_width <= 1.0) {
            return Err(anyhow!("bar width must be within (0, 1], got {}", style.bar_width));
        }

        let (w, h) = (style.width as f32, style.height as f32);
        let plot = PlotArea {
            left: (w * 0.09).round(),
            top: (h * 0.12).round(),
            right: (w * 0.97).round(),
            bottom: (h * 0.76).round(),
        };

        let slot = plot.width() / table.len() as f32;
        let half_bar = slot * style.bar_width / 2.0;
        let tick_pad = (h * 0.015).max(4.0);

        let bars = table
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let center = plot.left + slot * (i as f32 + 0.5);
                Bar {
                    class: entry.class.clone(),
                    score: entry.score,
                    label: format_score(entry.score),
                    color: viridis(table.normalized(entry.score)),
                    left: center - half_bar,
                    right: center + half_bar,
                    top: plot.y_for(entry.score),
                    bottom: plot.bottom,
                    label_anchor: (center, plot.y_for(entry.score + style.label_offset)),
                    tick_anchor: (center, plot.bottom + tick_pad),
                }
            })
            .collect();

        let steps = ((Y_RANGE.1 - Y_RANGE.0) / GRID_STEP).round() as usize;
        let gridlines = (0..=steps)
            .map(|i| {
                let value = Y_RANGE.0 + GRID_STEP * i as f32;
                GridLine {
                    value,
                    y: plot.y_for(value),
                    label: format!("{:.1}", value),
                }
            })
            .collect();

        Ok(Self {
            width: style.width,
            height: style.height,
            plot,
            bars,
            gridlines,
            style: style.clone(),
        })
    }
}

/// Value label text for a bar: the score rounded to two decimals.
pub fn format_score(score: f32) -> String {
    // round the shortest decimal form; 0.765f32 is stored as 0.76499998
    let decimal: f64 = score.to_string().parse().unwrap_or(score as f64);
    format!("{:.2}", decimal)
}

/// Validates parallel `names`/`scores` and renders them in one call.
pub fn plot_scores<S: AsRef<str>>(
    names: &[S],
    scores: &[f32],
    style: &ChartStyle,
    font: Option<&ab_glyph::FontVec>,
) -> Result<RgbImage> {
    let table = ScoreTable::from_parallel(names, scores)?;
    let layout = ChartLayout::compute(&table, style)?;
    Ok(render(&layout, font))
}

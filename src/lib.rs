//! Station Vision support crate
//!
//! Two independent pieces used around the space-station safety-equipment
//! detector:
//!
//! - `config`: resolves the detection service settings once at startup
//!   (defaults, optional JSON file, `PORT` / `MODEL_PATH` overrides) into an
//!   immutable [`AppConfig`].
//! - `scores` + `chart`: renders per-class mAP50 scores as a colour-mapped
//!   bar chart.
//!
//! # Module Structure
//!
//! - `env`: injectable environment lookup and the env defaulting helper
//! - `config`: `AppConfig` and its settings sections
//! - `codec`: JPEG/PNG encoding driven by `ImageSettings`
//! - `scores`: validated, ordered class scores
//! - `chart`: layout, viridis colour map, rasterisation

pub mod chart;
pub mod codec;
pub mod config;
pub mod env;
pub mod scores;

pub use chart::{ChartLayout, ChartStyle};
pub use codec::ImageEncoding;
pub use config::{AllowedOrigins, AppConfig, AsyncMode, ImageSettings};
pub use env::{EnvSource, ProcessEnv};
pub use scores::{ClassScore, ScoreTable};

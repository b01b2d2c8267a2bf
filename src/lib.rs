//! # streamplot-rs: Viewport engine for streaming charts
//!
//! Keeps an unbounded, growing set of uniformly sampled channels in memory and
//! turns "what part of the chart is visible, at what pixel width" into a small,
//! bounded set of points per channel, so that repaint cost stays flat as
//! acquisition runs for hours.
//!
//! ## Architecture
//!
//! - **Storage**: [`ChunkedBuffer`] chunks and the lock-protected
//!   [`SeriesRegistry`] shared between producer threads and the render loop
//! - **View**: [`ViewportDownsampler`] picks a decimation policy per repaint;
//!   [`ZoomRangeStack`] keeps the LIFO history of axis ranges
//! - **Chart**: [`LiveChart`] ties storage and view together and replays frames
//!   into a host [`RenderSink`]
//! - **Communication**: zoom notifications on a `crossbeam-channel`
//!
//! ## Configuration
//!
//! [`ChartConfig`] is stored as JSON in the platform config directory under
//! `dev.streamplot.streamplot-rs`.
//!
//! ## Example
//!
//! ```ignore
//! use streamplot_rs::{ChartConfig, LiveChart};
//!
//! let mut chart = LiveChart::from_config(&ChartConfig::default())?;
//! chart.add_channel("pressure", None, 0)?;
//!
//! let registry = chart.registry().clone();
//! std::thread::spawn(move || {
//!     for i in 0..10_000 {
//!         registry.append_frame(&[i as f64]).ok();
//!     }
//! });
//!
//! if let Some(frame) = chart.tick() {
//!     println!("{} points", frame.series[0].points.len());
//! }
//! ```

pub mod chart;
pub mod config;
pub mod error;
pub mod signal;
pub mod storage;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use chart::{LiveChart, RenderSink};
pub use config::{settings::RuntimeSettings, ChartConfig};
pub use error::{Result, StreamPlotError};
pub use signal::{SignalGenerator, SignalPattern};
pub use storage::{ChunkedBuffer, SeriesRegistry};
pub use types::{AxisRange, DisplayMode, PlotPoint, Rgba};
pub use view::{
    AxisSet, DownsampledFrame, RangeStatistics, Viewport, ViewportDownsampler, ZoomEvent,
    ZoomRangeStack, ZoomScope,
};

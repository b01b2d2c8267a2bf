//! View computation
//!
//! Everything between stored samples and the render sink:
//!
//! - [`axis`] - visual/whole ranges of the chart's axes
//! - [`downsample`] - pixel-budgeted decimation of the visible window
//! - [`zoom`] - LIFO history of axis ranges, auto-fit and stacked layout
//! - [`statistics`] - per-channel statistics over the visible window

pub mod axis;
pub mod downsample;
pub mod statistics;
pub mod zoom;

pub use axis::{Axis, AxisSet, SeriesPoints};
pub use downsample::{
    DecimatedSeries, DecimationPlan, DownsampledFrame, Viewport, ViewportDownsampler,
    EDGE_PADDING_POINTS,
};
pub use statistics::RangeStatistics;
pub use zoom::{ViewportRange, ZoomEvent, ZoomFrame, ZoomRangeStack, ZoomScope};

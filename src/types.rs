//! Core data types for streamplot-rs
//!
//! This module contains the small value types shared by the storage, view and
//! chart layers.
//!
//! # Main Types
//!
//! - [`AxisRange`] - Closed numeric interval used for visual and whole ranges
//! - [`DisplayMode`] - Decimation policy selected for a repaint
//! - [`PlotPoint`] - A `(time, value)` pair as handed to the render sink
//!
//! # Colors
//!
//! Channels registered without an explicit color get one from
//! [`channel_color`], which spreads hues with the golden ratio so that
//! neighbouring channels stay distinguishable on light and dark backgrounds.

use serde::{Deserialize, Serialize};

/// A `(time, value)` pair in data space
pub type PlotPoint = [f64; 2];

/// RGBA color
pub type Rgba = [u8; 4];

/// Closed numeric interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl AxisRange {
    /// Create a new range, swapping bounds if needed
    pub fn new(min: f64, max: f64) -> Self {
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    /// Width of the range
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Check whether both bounds are finite and the span is positive
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.span() > 0.0
    }

    /// Check whether a value lies inside the range (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check whether this range fully covers `other`
    pub fn covers(&self, other: &AxisRange) -> bool {
        self.min <= other.min && self.max >= other.max
    }

    /// Grow both ends by `percent` of the span
    pub fn expanded_by_percent(&self, percent: f64) -> Self {
        let pad = self.span() * percent / 100.0;
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Shift the range by `delta` without changing its span
    pub fn shifted(&self, delta: f64) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }
}

/// Running min/max accumulator
///
/// Starts at `min = +inf, max = -inf`; non-finite values (NaN gap samples)
/// are ignored. Empty until at least one finite value is seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Extent {
    /// Fold a value into the extent
    #[inline]
    pub fn include(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// True if no finite value was ever included
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// The extent as a range, if anything was included
    pub fn range(&self) -> Option<AxisRange> {
        (!self.is_empty()).then(|| AxisRange::new(self.min, self.max))
    }
}

/// Decimation policy for one repaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DisplayMode {
    /// Visible range equals the whole range; decimate over every sample
    #[default]
    WholeRange,
    /// Visible range is a proper subset selected by zoom/pan
    Zoomed,
    /// Visible range follows live data; start/stop recomputed each call
    Live,
}

impl DisplayMode {
    /// Pick WholeRange when the visible range covers the whole range,
    /// Zoomed otherwise
    pub fn for_ranges(visible: &AxisRange, whole: &AxisRange) -> Self {
        if visible.covers(whole) {
            DisplayMode::WholeRange
        } else {
            DisplayMode::Zoomed
        }
    }

    /// Get display name for this mode
    pub fn display_name(&self) -> &'static str {
        match self {
            DisplayMode::WholeRange => "Whole range",
            DisplayMode::Zoomed => "Zoomed",
            DisplayMode::Live => "Live",
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Generate a distinct color based on an index
/// Uses the golden ratio to spread hues evenly across the color wheel
pub fn channel_color(index: usize) -> Rgba {
    // Use golden ratio conjugate for optimal hue distribution
    const GOLDEN_RATIO: f32 = 0.618033988749895;

    let hue = (((index as f32 + 1.0) * GOLDEN_RATIO) % 1.0) * 360.0;

    // Medium saturation and value for visibility on both light and dark themes
    let (r, g, b) = hsv_to_rgb(hue, 0.7, 0.85);
    [r, g, b, 255]
}

/// Convert HSV (hue 0-360, saturation 0-1, value 0-1) to RGB (u8, u8, u8)
fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> (u8, u8, u8) {
    let c = value * saturation;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = value - c;

    let (r, g, b) = match (hue / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

//! Axis ranges as seen by the engine
//!
//! The host chart owns the real coordinate mapping (pixels to data). The
//! engine only needs each axis's visual range (what is on screen) and whole
//! range (the full scrollable extent), which [`AxisSet`] tracks for one or
//! more X axes and any number of Y axes.

use crate::types::{AxisRange, PlotPoint};

/// Visual and whole range of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    /// Currently displayed range
    pub visual: AxisRange,
    /// Full available range
    pub whole: AxisRange,
}

impl Axis {
    /// Create an axis whose visual range equals its whole range
    pub fn new(range: AxisRange) -> Self {
        Self {
            visual: range,
            whole: range,
        }
    }

    /// Set both visual and whole range
    pub fn set_range(&mut self, range: AxisRange) {
        self.visual = range;
        self.whole = range;
    }

    /// True when the visual range shows everything
    pub fn is_zoomed_out(&self) -> bool {
        self.visual.covers(&self.whole)
    }
}

/// All axes of one chart: X axes first, then primary and secondary Y axes
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSet {
    pub x: Vec<Axis>,
    pub y: Vec<Axis>,
}

impl AxisSet {
    /// One X axis and one Y axis
    pub fn new(x: AxisRange, y: AxisRange) -> Self {
        Self {
            x: vec![Axis::new(x)],
            y: vec![Axis::new(y)],
        }
    }

    /// Add a secondary Y axis
    pub fn with_secondary_y(mut self, range: AxisRange) -> Self {
        self.y.push(Axis::new(range));
        self
    }

    /// Make sure at least `count` Y axes exist
    pub fn ensure_y_axes(&mut self, count: usize) {
        while self.y.len() < count {
            self.y.push(Axis::new(AxisRange::default()));
        }
    }

    /// Primary X axis
    pub fn primary_x(&self) -> Option<&Axis> {
        self.x.first()
    }

    /// Mutable primary X axis
    pub fn primary_x_mut(&mut self) -> Option<&mut Axis> {
        self.x.first_mut()
    }
}

impl Default for AxisSet {
    fn default() -> Self {
        Self::new(AxisRange::default(), AxisRange::default())
    }
}

/// One plotted series as seen by range-fitting operations
#[derive(Debug, Clone, Copy)]
pub struct SeriesPoints<'a> {
    pub x_axis: usize,
    pub y_axis: usize,
    pub visible: bool,
    pub points: &'a [PlotPoint],
}

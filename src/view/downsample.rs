//! Viewport decimation
//!
//! Turns "which time range is visible, at what pixel width" into a bounded
//! number of `(time, value)` points per visible channel, so render cost does
//! not grow with the number of accumulated samples.
//!
//! # Policies
//!
//! - [`DisplayMode::WholeRange`]: one point per pixel across every sample, or
//!   every sample when there are fewer samples than pixels.
//! - [`DisplayMode::Zoomed`]: only the visible index window, padded by a few
//!   points on both sides so the line runs past the viewport edges while
//!   panning.
//! - [`DisplayMode::Live`]: like Zoomed but the window is re-derived from the
//!   live visible range every call and extended so a growing stream is never
//!   drawn with a truncated right edge.
//!
//! Times are reconstructed as `start*period + round(i*stride)*period`. The
//! rounding matches the index rounding in
//! [`ChunkedBuffer::to_vec_fractional`](crate::storage::ChunkedBuffer::to_vec_fractional),
//! so every point sits on a real sample time.
//!
//! # Locking
//!
//! The registry lock is held only while the plan is computed and the
//! pixel-budgeted values are copied out; point assembly happens after the
//! guard drops.

use std::sync::Arc;

use crate::error::{Result, ResultExt, StreamPlotError};
use crate::storage::SeriesRegistry;
use crate::types::{AxisRange, DisplayMode, PlotPoint, Rgba};
use crate::view::axis::SeriesPoints;

/// Points added past the visible window so lines reach the viewport edges
pub const EDGE_PADDING_POINTS: usize = 4;

/// Visible and whole range of the primary X axis plus the pixel budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub visible: AxisRange,
    pub whole: AxisRange,
    pub pixel_width: usize,
}

impl Viewport {
    pub fn new(visible: AxisRange, whole: AxisRange, pixel_width: usize) -> Self {
        Self {
            visible,
            whole,
            pixel_width,
        }
    }

    /// Mode implied by the ranges alone
    pub fn implied_mode(&self) -> DisplayMode {
        DisplayMode::for_ranges(&self.visible, &self.whole)
    }
}

/// Which samples a decimation pass reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimationPlan {
    /// First sample index
    pub start: usize,
    /// Spacing between emitted points, in samples
    pub stride: f64,
    /// Number of points to emit
    pub count: usize,
}

impl DecimationPlan {
    /// Plan over every sample
    pub fn whole_range(points_count: usize, pixel_width: usize) -> Option<Self> {
        if points_count == 0 || pixel_width == 0 {
            return None;
        }

        let ratio = points_count as f64 / pixel_width as f64;
        let plan = if ratio > 1.0 {
            Self {
                start: 0,
                stride: ratio,
                count: pixel_width,
            }
        } else {
            Self {
                start: 0,
                stride: 1.0,
                count: points_count,
            }
        };
        Some(plan)
    }

    /// Plan over the visible window of a zoomed view
    pub fn zoomed(
        visible: AxisRange,
        base_period: f64,
        points_count: usize,
        pixel_width: usize,
    ) -> Option<Self> {
        let width = visible.span();
        if points_count == 0 || pixel_width == 0 || width <= 0.0 {
            return None;
        }

        let start = first_visible_index(visible.min, base_period);
        if start >= points_count {
            return None;
        }
        let raw = (width / base_period).ceil() as usize;
        let count = raw.min(points_count - start);
        if count == 0 {
            return None;
        }

        Some(Self::padded(start, count, pixel_width))
    }

    /// Plan for a live, follow-latest view
    pub fn live(
        visible: AxisRange,
        base_period: f64,
        points_count: usize,
        pixel_width: usize,
    ) -> Option<Self> {
        if points_count == 0 || pixel_width == 0 || visible.span() <= 0.0 {
            return None;
        }

        let start = first_visible_index(visible.min, base_period);
        let stop = ((visible.max / base_period).ceil().max(0.0) as usize).min(points_count);
        if stop <= start {
            return None;
        }

        let mut plan = Self::padded(start, stop - start, pixel_width);
        if plan.last_index() + 1 < points_count {
            plan.count += 1;
        }
        Some(plan)
    }

    /// Stride choice, edge padding and left pre-roll shared by the windowed
    /// policies
    fn padded(start: usize, count: usize, pixel_width: usize) -> Self {
        let stride = if count <= pixel_width {
            1.0
        } else {
            count as f64 / pixel_width as f64
        };

        let mut start = start;
        let mut count = (count as f64 / stride) as usize + EDGE_PADDING_POINTS;
        if start as f64 - stride >= 0.0 {
            start = (start as f64 - stride) as usize;
            count += 1;
        }

        Self {
            start,
            stride,
            count,
        }
    }

    /// Sample index read for output point `i`
    #[inline]
    pub fn index_at(&self, i: usize) -> usize {
        self.start + (i as f64 * self.stride).round() as usize
    }

    /// Sample index read for the last output point
    pub fn last_index(&self) -> usize {
        self.index_at(self.count.saturating_sub(1))
    }

    /// Reconstructed time of output point `i`
    #[inline]
    pub fn time_at(&self, i: usize, base_period: f64) -> f64 {
        self.start as f64 * base_period + (i as f64 * self.stride).round() * base_period
    }
}

fn first_visible_index(visible_min: f64, base_period: f64) -> usize {
    (visible_min / base_period).floor().max(0.0) as usize
}

/// Decimated points of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct DecimatedSeries {
    pub name: String,
    pub color: Rgba,
    pub y_axis: usize,
    pub points: Vec<PlotPoint>,
}

/// Output of one decimation pass
#[derive(Debug, Clone, PartialEq)]
pub struct DownsampledFrame {
    pub mode: DisplayMode,
    pub plan: DecimationPlan,
    /// Sample count every channel was read against
    pub points_count: usize,
    pub series: Vec<DecimatedSeries>,
}

impl DownsampledFrame {
    /// Series by channel name
    pub fn series(&self, name: &str) -> Option<&DecimatedSeries> {
        self.series.iter().find(|s| s.name == name)
    }

    /// All series as range-fitting input on X axis 0
    pub fn series_points(&self) -> impl Iterator<Item = SeriesPoints<'_>> {
        self.series.iter().map(|s| SeriesPoints {
            x_axis: 0,
            y_axis: s.y_axis,
            visible: true,
            points: &s.points,
        })
    }
}

/// Computes decimated point sets from a shared [`SeriesRegistry`]
#[derive(Debug, Clone)]
pub struct ViewportDownsampler {
    registry: Arc<SeriesRegistry>,
}

impl ViewportDownsampler {
    pub fn new(registry: Arc<SeriesRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SeriesRegistry> {
        &self.registry
    }

    /// Decimate for a repaint
    ///
    /// Returns `None` when there is nothing to draw: no viewport, zero pixel
    /// width, no channels, an empty visible window, or a storage error. Errors
    /// are logged and swallowed here so the render loop keeps the previous
    /// frame on screen.
    pub fn recompute(
        &self,
        viewport: Option<&Viewport>,
        mode: DisplayMode,
    ) -> Option<DownsampledFrame> {
        match self.try_recompute(viewport, mode) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Skipping repaint: {}", e);
                None
            }
        }
    }

    /// Decimate for a repaint, surfacing storage errors
    pub fn try_recompute(
        &self,
        viewport: Option<&Viewport>,
        mode: DisplayMode,
    ) -> Result<Option<DownsampledFrame>> {
        let Some(viewport) = viewport else {
            return Ok(None);
        };
        if viewport.pixel_width == 0 {
            return Ok(None);
        }

        let base_period = self.registry.base_period();

        let (points_count, plan, columns) = {
            let set = self.registry.lock();
            if set.is_empty() {
                return Ok(None);
            }

            let points_count = set.check_aligned()?;
            if points_count == 0 {
                return Err(StreamPlotError::Empty("registry has no samples"));
            }

            let plan = match mode {
                DisplayMode::WholeRange => {
                    DecimationPlan::whole_range(points_count, viewport.pixel_width)
                }
                DisplayMode::Zoomed => DecimationPlan::zoomed(
                    viewport.visible,
                    base_period,
                    points_count,
                    viewport.pixel_width,
                ),
                DisplayMode::Live => DecimationPlan::live(
                    viewport.visible,
                    base_period,
                    points_count,
                    viewport.pixel_width,
                ),
            };
            let Some(plan) = plan else {
                return Ok(None);
            };

            let mut columns = Vec::with_capacity(set.len());
            for channel in set.iter().filter(|c| c.is_visible()) {
                let values = channel
                    .buffer()
                    .to_vec_fractional(plan.start, plan.stride, plan.count)
                    .with_context(|| format!("Failed to decimate channel '{}'", channel.name()))?;
                columns.push((
                    channel.name().to_string(),
                    channel.color(),
                    channel.y_axis(),
                    values,
                ));
            }

            (points_count, plan, columns)
        };

        tracing::trace!(
            "{} decimation: start {}, stride {:.3}, {} points x {} channels",
            mode,
            plan.start,
            plan.stride,
            plan.count,
            columns.len()
        );

        let series = columns
            .into_iter()
            .map(|(name, color, y_axis, values)| DecimatedSeries {
                name,
                color,
                y_axis,
                points: values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| [plan.time_at(i, base_period), v])
                    .collect(),
            })
            .collect();

        Ok(Some(DownsampledFrame {
            mode,
            plan,
            points_count,
            series,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(period: f64, channels: &[&str], samples: usize) -> Arc<SeriesRegistry> {
        let reg = Arc::new(SeriesRegistry::new(period, 256).unwrap());
        for name in channels {
            reg.add_channel_auto(*name).unwrap();
        }
        {
            let mut set = reg.lock();
            for i in 0..samples {
                let frame: Vec<f64> = (0..channels.len()).map(|c| (i * (c + 1)) as f64).collect();
                set.append_frame(&frame).unwrap();
            }
        }
        reg
    }

    fn whole_viewport(period: f64, samples: usize, width: usize) -> Viewport {
        let whole = AxisRange::new(0.0, (samples - 1) as f64 * period);
        Viewport::new(whole, whole, width)
    }

    #[test]
    fn test_whole_range_point_budget() {
        let plan = DecimationPlan::whole_range(100_000, 800).unwrap();
        assert_eq!(plan.count, 800);
        assert_eq!(plan.stride, 125.0);

        let plan = DecimationPlan::whole_range(50, 800).unwrap();
        assert_eq!(plan.count, 50);
        assert_eq!(plan.stride, 1.0);

        let plan = DecimationPlan::whole_range(800, 800).unwrap();
        assert_eq!(plan.count, 800);
        assert_eq!(plan.stride, 1.0);
    }

    #[test]
    fn test_whole_range_never_reads_past_end() {
        for (n, w) in [(100_000, 800), (1001, 1000), (12_345, 777)] {
            let plan = DecimationPlan::whole_range(n, w).unwrap();
            assert!(plan.last_index() < n, "n={n} w={w}");
        }
    }

    #[test]
    fn test_zoomed_plan_padding_and_preroll() {
        let plan = DecimationPlan::zoomed(AxisRange::new(200_000.0, 300_000.0), 1000.0, 1000, 100)
            .unwrap();
        assert_eq!(plan.stride, 1.0);
        assert_eq!(plan.start, 199);
        assert_eq!(plan.count, 100 + EDGE_PADDING_POINTS + 1);
    }

    #[test]
    fn test_zoomed_plan_decimates_wide_windows() {
        let plan =
            DecimationPlan::zoomed(AxisRange::new(0.0, 10_000.0), 1.0, 100_000, 1000).unwrap();
        assert_eq!(plan.stride, 10.0);
        // No pre-roll at index 0
        assert_eq!(plan.start, 0);
        assert_eq!(plan.count, 1000 + EDGE_PADDING_POINTS);
    }

    #[test]
    fn test_zoomed_plan_clamps_to_data() {
        let plan = DecimationPlan::zoomed(AxisRange::new(900.0, 5_000.0), 1.0, 1000, 500).unwrap();
        // 100 visible samples, stride 1, shifted left by one
        assert_eq!(plan.start, 899);
        assert_eq!(plan.count, 100 + EDGE_PADDING_POINTS + 1);
    }

    #[test]
    fn test_zoomed_plan_empty_cases() {
        let visible = AxisRange { min: 5.0, max: 5.0 };
        assert!(DecimationPlan::zoomed(visible, 1.0, 100, 100).is_none());
        assert!(DecimationPlan::zoomed(AxisRange::new(0.0, 10.0), 1.0, 100, 0).is_none());
        assert!(DecimationPlan::zoomed(AxisRange::new(500.0, 600.0), 1.0, 100, 100).is_none());
    }

    #[test]
    fn test_live_plan_reaches_latest_sample() {
        let n = 10_000;
        let plan = DecimationPlan::live(AxisRange::new(0.0, 9_999.0), 1.0, n, 333).unwrap();
        assert!(plan.stride > 1.0);
        // The padded plan must read at least up to the last sample
        assert!(plan.last_index() + 1 >= n);
    }

    #[test]
    fn test_live_plan_grows_when_short() {
        // 37 samples over 10 pixels: stride 3.7, 10 + 4 points reach index 48
        let plan = DecimationPlan::live(AxisRange::new(0.0, 37.0), 1.0, 37, 10).unwrap();
        assert!(plan.last_index() + 1 >= 37);

        // Window ending well before the data end is extended by one point
        let plan = DecimationPlan::live(AxisRange::new(0.0, 20.0), 1.0, 1000, 100).unwrap();
        let base = DecimationPlan::zoomed(AxisRange::new(0.0, 20.0), 1.0, 1000, 100).unwrap();
        assert_eq!(plan.count, base.count + 1);
    }

    #[test]
    fn test_time_reconstruction_rounds() {
        let plan = DecimationPlan {
            start: 10,
            stride: 2.5,
            count: 4,
        };
        let times: Vec<f64> = (0..4).map(|i| plan.time_at(i, 2.0)).collect();
        assert_eq!(times, vec![20.0, 26.0, 30.0, 36.0]);
    }

    #[test]
    fn test_recompute_whole_range_two_channels() {
        let reg = registry_with(1000.0, &["A", "B"], 1000);
        let ds = ViewportDownsampler::new(reg);
        let vp = whole_viewport(1000.0, 1000, 500);

        let frame = ds.recompute(Some(&vp), DisplayMode::WholeRange).unwrap();
        assert_eq!(frame.series.len(), 2);
        for series in &frame.series {
            assert_eq!(series.points.len(), 500);
            assert_eq!(series.points[0][0], 0.0);
            assert!((series.points[499][0] - 999_000.0).abs() <= 2.0 * 1000.0);
        }
        // Values line up with their sample times
        let b = frame.series("B").unwrap();
        for p in &b.points {
            assert_eq!(p[1], 2.0 * (p[0] / 1000.0));
        }
    }

    #[test]
    fn test_recompute_zoomed_scenario() {
        let reg = registry_with(1000.0, &["A", "B"], 1000);
        let ds = ViewportDownsampler::new(reg);
        let vp = Viewport::new(
            AxisRange::new(200_000.0, 300_000.0),
            AxisRange::new(0.0, 999_000.0),
            100,
        );

        let frame = ds.recompute(Some(&vp), DisplayMode::Zoomed).unwrap();
        assert_eq!(frame.plan.stride, 1.0);
        let a = frame.series("A").unwrap();
        assert!(a.points.len() > 100);
        assert!(a.points[0][0] <= 200_000.0);
        assert_eq!(a.points[0][1], 199.0);
    }

    #[test]
    fn test_recompute_noop_cases() {
        let reg = registry_with(1.0, &["A"], 100);
        let ds = ViewportDownsampler::new(Arc::clone(&reg));

        assert!(ds.recompute(None, DisplayMode::WholeRange).is_none());

        let zero_width = whole_viewport(1.0, 100, 0);
        assert!(ds.recompute(Some(&zero_width), DisplayMode::WholeRange).is_none());

        let flat = Viewport::new(
            AxisRange { min: 5.0, max: 5.0 },
            AxisRange::new(0.0, 99.0),
            100,
        );
        assert!(ds.recompute(Some(&flat), DisplayMode::Zoomed).is_none());

        let empty = ViewportDownsampler::new(Arc::new(SeriesRegistry::new(1.0, 8).unwrap()));
        assert!(empty
            .try_recompute(Some(&whole_viewport(1.0, 100, 100)), DisplayMode::WholeRange)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_recompute_empty_registry_is_error() {
        let reg = Arc::new(SeriesRegistry::new(1.0, 8).unwrap());
        reg.add_channel_auto("A").unwrap();
        let ds = ViewportDownsampler::new(reg);
        let vp = whole_viewport(1.0, 10, 100);

        assert!(matches!(
            ds.try_recompute(Some(&vp), DisplayMode::WholeRange),
            Err(StreamPlotError::Empty(_))
        ));
        assert!(ds.recompute(Some(&vp), DisplayMode::WholeRange).is_none());
    }

    #[test]
    fn test_recompute_rejects_misaligned_channels() {
        let reg = registry_with(1.0, &["A", "B"], 10);
        reg.append("A", 1.0).unwrap();
        let ds = ViewportDownsampler::new(reg);
        let vp = whole_viewport(1.0, 11, 100);

        assert!(matches!(
            ds.try_recompute(Some(&vp), DisplayMode::WholeRange),
            Err(StreamPlotError::ChannelLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_hidden_channels_skipped() {
        let reg = registry_with(1.0, &["A", "B"], 100);
        reg.lock().by_name_mut("A").unwrap().set_visible(false);
        let ds = ViewportDownsampler::new(reg);

        let frame = ds
            .recompute(Some(&whole_viewport(1.0, 100, 50)), DisplayMode::WholeRange)
            .unwrap();
        assert_eq!(frame.series.len(), 1);
        assert_eq!(frame.series[0].name, "B");
    }

    #[test]
    fn test_zoom_past_end_holds_last_value() {
        let reg = registry_with(1.0, &["A"], 100);
        let ds = ViewportDownsampler::new(reg);
        let vp = Viewport::new(AxisRange::new(90.0, 120.0), AxisRange::new(0.0, 99.0), 200);

        let frame = ds.recompute(Some(&vp), DisplayMode::Zoomed).unwrap();
        let a = frame.series("A").unwrap();
        let last = a.points.last().unwrap();
        assert_eq!(last[1], 99.0);
    }
}

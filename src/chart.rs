//! Live chart facade
//!
//! [`LiveChart`] ties the pieces together for a host that renders a
//! streaming chart: it owns the axis state, the zoom history and the last
//! decimated frame, and shares the [`SeriesRegistry`] with producer threads.
//!
//! A typical render loop:
//!
//! ```ignore
//! let mut chart = LiveChart::from_config(&config)?;
//! let registry = chart.registry().clone();
//! std::thread::spawn(move || registry.append_frame(&[1.0, 2.0]));
//!
//! loop {
//!     if chart.tick().is_some() {
//!         chart.render_into(&mut sink);
//!     }
//!     for event in chart.drain_events() { /* update zoom indicator */ }
//! }
//! ```
//!
//! # Follow latest
//!
//! While follow-latest is on, every [`LiveChart::tick`] moves the X visual
//! range to the newest `live_window` seconds and decimates in
//! [`DisplayMode::Live`]. Any operation that changes the X range (zoom-in,
//! auto-set) switches it off; popping the zoom stack back to empty switches
//! it on again if it was on before.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver};

use crate::config::settings::RuntimeSettings;
use crate::config::ChartConfig;
use crate::error::{Result, StreamPlotError};
use crate::storage::SeriesRegistry;
use crate::types::{AxisRange, DisplayMode, PlotPoint, Rgba};
use crate::view::{
    AxisSet, DownsampledFrame, RangeStatistics, SeriesPoints, Viewport, ViewportDownsampler,
    ZoomEvent, ZoomRangeStack, ZoomScope,
};

/// Room for one depth change and one repaint request
const MIN_EVENT_CAPACITY: usize = 2;

/// Destination for decimated lines
///
/// Implemented by the host's chart widget. A frame is replayed as one
/// `clear` followed by one `draw_line` per channel.
#[cfg_attr(test, mockall::automock)]
pub trait RenderSink {
    /// Drop whatever was drawn for `channel`
    fn clear(&mut self, channel: &str);

    /// Draw `points` as a connected line
    fn draw_line(&mut self, channel: &str, color: Rgba, y_axis: usize, points: &[PlotPoint]);
}

/// Streaming chart state shared by the render loop
pub struct LiveChart {
    registry: Arc<SeriesRegistry>,
    downsampler: ViewportDownsampler,
    axes: AxisSet,
    zoom: ZoomRangeStack,
    events: Receiver<ZoomEvent>,
    settings: RuntimeSettings,
    /// Follow-latest state to restore when the zoom stack empties
    resume_follow: bool,
    last_frame: Option<DownsampledFrame>,
}

impl LiveChart {
    /// Create a chart over an existing registry
    pub fn new(registry: Arc<SeriesRegistry>, settings: RuntimeSettings, event_capacity: usize) -> Self {
        let (tx, rx) = bounded(event_capacity.max(MIN_EVENT_CAPACITY));
        let axes = AxisSet::new(
            AxisRange::new(0.0, settings.live_window),
            AxisRange::default(),
        );

        tracing::info!(
            "Live chart created: period {}s, {} px, follow latest {}",
            registry.base_period(),
            settings.pixel_width,
            settings.follow_latest
        );

        Self {
            downsampler: ViewportDownsampler::new(Arc::clone(&registry)),
            registry,
            axes,
            zoom: ZoomRangeStack::new().with_events(tx, rx.clone()),
            events: rx,
            resume_follow: settings.follow_latest,
            settings,
            last_frame: None,
        }
    }

    /// Create a chart and an empty registry from configuration
    pub fn from_config(config: &ChartConfig) -> Result<Self> {
        config.validate()?;
        let registry = SeriesRegistry::new(config.buffer.base_period, config.buffer.chunk_size)?;
        Ok(Self::new(
            Arc::new(registry),
            RuntimeSettings::from_config(config),
            config.zoom.event_capacity,
        ))
    }

    /// Shared sample store; clone the `Arc` to hand it to producers
    pub fn registry(&self) -> &Arc<SeriesRegistry> {
        &self.registry
    }

    pub fn axes(&self) -> &AxisSet {
        &self.axes
    }

    /// Mutable axes, for host-driven pan and scroll
    pub fn axes_mut(&mut self) -> &mut AxisSet {
        &mut self.axes
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Mutable settings
    ///
    /// Switch follow-latest through [`set_follow_latest`](Self::set_follow_latest)
    /// so that the zoom stack knows whether to resume it.
    pub fn settings_mut(&mut self) -> &mut RuntimeSettings {
        &mut self.settings
    }

    /// Last frame produced by a successful recompute
    pub fn last_frame(&self) -> Option<&DownsampledFrame> {
        self.last_frame.as_ref()
    }

    /// Register a channel drawn against Y axis `y_axis`
    pub fn add_channel(&mut self, name: &str, color: Option<Rgba>, y_axis: usize) -> Result<usize> {
        let position = {
            let mut set = self.registry.lock();
            let position = match color {
                Some(color) => set.add_channel(name, color)?,
                None => set.add_channel_auto(name)?,
            };
            if let Some(channel) = set.get_mut(position) {
                channel.set_y_axis(y_axis);
            }
            position
        };
        self.axes.ensure_y_axes(y_axis + 1);
        Ok(position)
    }

    /// Show or hide a channel
    pub fn set_channel_visible(&self, name: &str, visible: bool) -> Result<()> {
        let mut set = self.registry.lock();
        let channel = set
            .by_name_mut(name)
            .ok_or_else(|| StreamPlotError::UnknownChannel(name.to_string()))?;
        channel.set_visible(visible);
        Ok(())
    }

    /// Append one sample to a channel
    pub fn append(&self, name: &str, value: f64) -> Result<()> {
        self.registry.append(name, value)
    }

    /// Append one sample to every channel, in registration order
    pub fn append_frame(&self, values: &[f64]) -> Result<()> {
        self.registry.append_frame(values)
    }

    /// Receiver for zoom notifications
    pub fn events(&self) -> &Receiver<ZoomEvent> {
        &self.events
    }

    /// Take every pending zoom notification
    pub fn drain_events(&self) -> Vec<ZoomEvent> {
        self.events.try_iter().collect()
    }

    /// Number of saved zoom levels
    pub fn zoom_depth(&self) -> usize {
        self.zoom.depth()
    }

    pub fn follow_latest(&self) -> bool {
        self.settings.follow_latest
    }

    pub fn set_follow_latest(&mut self, follow: bool) {
        self.settings.follow_latest = follow;
        self.resume_follow = follow;
    }

    /// Flip follow-latest; returns the new state
    pub fn toggle_follow_latest(&mut self) -> bool {
        let follow = !self.settings.follow_latest;
        self.set_follow_latest(follow);
        follow
    }

    /// Keep the X whole range in step with the stored samples
    ///
    /// With an empty zoom stack the whole range is the data extent, and an
    /// axis that was showing everything keeps doing so. Once ranges have been
    /// set by a zoom or auto-set, the whole range only grows when new data
    /// goes past it and the visual range is left alone.
    pub fn sync_whole_range(&mut self) {
        let points_count = self.registry.points_count();
        if points_count == 0 {
            return;
        }
        let data = AxisRange::new(0.0, (points_count - 1) as f64 * self.registry.base_period());
        let tracking = self.zoom.is_empty();
        let Some(axis) = self.axes.primary_x_mut() else {
            return;
        };

        if tracking {
            let zoomed_out = axis.is_zoomed_out();
            axis.whole = data;
            if zoomed_out {
                axis.visual = data;
            }
        } else {
            axis.whole = AxisRange::new(axis.whole.min.min(data.min), axis.whole.max.max(data.max));
        }
    }

    /// Current primary X viewport
    pub fn viewport(&self) -> Option<Viewport> {
        self.axes
            .primary_x()
            .map(|x| Viewport::new(x.visual, x.whole, self.settings.pixel_width))
    }

    /// Decimate for the current viewport in `mode`
    ///
    /// Returns the new frame, or `None` if there was nothing to draw; in that
    /// case [`last_frame`](Self::last_frame) still holds the previous one.
    pub fn recompute(&mut self, mode: DisplayMode) -> Option<&DownsampledFrame> {
        self.sync_whole_range();
        let viewport = self.viewport();
        let frame = self.downsampler.recompute(viewport.as_ref(), mode)?;
        tracing::trace!(
            "Frame: {} mode, {} series, {} samples",
            frame.mode,
            frame.series.len(),
            frame.points_count
        );
        self.last_frame = Some(frame);
        self.last_frame.as_ref()
    }

    /// One render tick
    ///
    /// Advances the follow-latest window if enabled, then decimates in the
    /// mode implied by the ranges.
    pub fn tick(&mut self) -> Option<&DownsampledFrame> {
        self.sync_whole_range();

        let mode = if self.settings.follow_latest {
            let window = self.settings.live_window;
            if let Some(axis) = self.axes.primary_x_mut() {
                let latest = axis.whole.max;
                axis.visual = if latest > window {
                    AxisRange::new(latest - window, latest)
                } else {
                    AxisRange::new(0.0, window)
                };
            }
            DisplayMode::Live
        } else {
            self.axes
                .primary_x()
                .map(|x| DisplayMode::for_ranges(&x.visual, &x.whole))
                .unwrap_or_default()
        };

        self.recompute(mode)
    }

    fn pause_follow(&mut self) {
        if self.settings.follow_latest {
            tracing::debug!("Follow latest paused by zoom");
            self.settings.follow_latest = false;
        }
    }

    fn resume_follow_if_unzoomed(&mut self) {
        if self.zoom.is_empty() && self.resume_follow && !self.settings.follow_latest {
            tracing::debug!("Follow latest resumed");
            self.settings.follow_latest = true;
        }
    }

    /// Zoom to explicit ranges (the result of a rectangle gesture)
    pub fn zoom_to(&mut self, x: Option<AxisRange>, y: Option<&[AxisRange]>) {
        if x.is_some() {
            self.pause_follow();
        }
        self.zoom.zoom_to(&mut self.axes, x, y);
    }

    /// Save the current ranges before a host-driven change limited to `scope`
    pub fn push_zoom(&mut self, scope: ZoomScope) {
        if scope.includes_x() {
            self.pause_follow();
        }
        self.zoom.push(&self.axes, scope);
    }

    /// Step back one zoom level
    pub fn zoom_out(&mut self) -> bool {
        let popped = self.zoom.out(&mut self.axes);
        self.resume_follow_if_unzoomed();
        popped
    }

    /// Undo every zoom level
    pub fn zoom_reset(&mut self) -> bool {
        let reset = self.zoom.reset(&mut self.axes);
        self.resume_follow_if_unzoomed();
        reset
    }

    /// Fit the axes to the last frame using the configured margins
    pub fn auto_set(&mut self) -> bool {
        let (x_margin, y_margin) = (self.settings.auto_set_x_margin, self.settings.auto_set_y_margin);
        self.auto_set_with(x_margin, y_margin)
    }

    /// Fit the axes to the last frame with explicit margins (percent)
    ///
    /// Returns false when no frame has been rendered yet.
    pub fn auto_set_with(&mut self, x_margin: f64, y_margin: f64) -> bool {
        if self.last_frame.is_none() {
            return false;
        }
        self.pause_follow();
        let visibility = self.channel_visibility();
        let Some(frame) = &self.last_frame else {
            return false;
        };
        self.zoom.auto_set(
            &mut self.axes,
            frame_series(frame, &visibility),
            x_margin,
            y_margin,
        );
        true
    }

    /// Lay out the Y axes in stacked bands based on the last frame
    pub fn stack(&mut self) -> bool {
        let visibility = self.channel_visibility();
        let Some(frame) = &self.last_frame else {
            return false;
        };
        self.zoom.stack(&mut self.axes, frame_series(frame, &visibility));
        true
    }

    /// Current visibility and Y axis of every channel
    fn channel_visibility(&self) -> HashMap<String, (bool, usize)> {
        let set = self.registry.lock();
        set.iter()
            .map(|c| (c.name().to_string(), (c.is_visible(), c.y_axis())))
            .collect()
    }

    /// Replay the last frame into `sink`
    ///
    /// Returns the number of lines drawn.
    pub fn render_into<S: RenderSink + ?Sized>(&self, sink: &mut S) -> usize {
        let Some(frame) = &self.last_frame else {
            return 0;
        };
        for series in &frame.series {
            sink.clear(&series.name);
            sink.draw_line(&series.name, series.color, series.y_axis, &series.points);
        }
        frame.series.len()
    }

    /// Statistics of every drawn channel over the visible X range
    pub fn visible_statistics(&self) -> Vec<(String, RangeStatistics)> {
        let (Some(frame), Some(x)) = (&self.last_frame, self.axes.primary_x()) else {
            return Vec::new();
        };
        frame
            .series
            .iter()
            .map(|s| {
                (
                    s.name.clone(),
                    RangeStatistics::from_points(&s.points, x.visual.min, x.visual.max),
                )
            })
            .collect()
    }
}

/// Series of `frame` with visibility and Y axis taken from the registry
fn frame_series<'a>(
    frame: &'a DownsampledFrame,
    visibility: &'a HashMap<String, (bool, usize)>,
) -> impl Iterator<Item = SeriesPoints<'a>> + 'a {
    frame.series.iter().filter_map(move |s| {
        let (visible, y_axis) = visibility.get(&s.name).copied()?;
        Some(SeriesPoints {
            x_axis: 0,
            y_axis,
            visible,
            points: &s.points,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::{always, eq};

    fn chart(follow: bool) -> LiveChart {
        let mut config = ChartConfig::default();
        config.buffer.base_period = 1.0;
        config.buffer.chunk_size = 64;
        config.view.pixel_width = 100;
        config.view.follow_latest = follow;
        config.view.live_window = 50.0;
        config.zoom.auto_set_y_margin = 0.0;

        let mut chart = LiveChart::from_config(&config).unwrap();
        chart.add_channel("A", None, 0).unwrap();
        chart.add_channel("B", Some([255, 0, 0, 255]), 1).unwrap();
        chart
    }

    fn fill(chart: &LiveChart, samples: usize) {
        let start = chart.registry().points_count();
        for i in start..start + samples {
            chart.append_frame(&[i as f64, -(i as f64)]).unwrap();
        }
    }

    #[test]
    fn test_add_channel_creates_y_axes() {
        let chart = chart(false);
        assert_eq!(chart.axes().y.len(), 2);
        assert_eq!(chart.registry().channel_count(), 2);
        assert_eq!(chart.registry().lock().by_name("B").unwrap().y_axis(), 1);
    }

    #[test]
    fn test_tick_whole_range_tracks_growth() {
        let mut chart = chart(false);
        assert!(chart.tick().is_none());

        fill(&chart, 10);
        let frame = chart.tick().unwrap();
        assert_eq!(frame.mode, DisplayMode::WholeRange);
        assert_eq!(frame.points_count, 10);

        fill(&chart, 990);
        let frame = chart.tick().unwrap();
        assert_eq!(frame.mode, DisplayMode::WholeRange);
        assert_eq!(frame.series("A").unwrap().points.len(), 100);
        assert_eq!(chart.axes().x[0].visual, AxisRange::new(0.0, 999.0));
    }

    #[test]
    fn test_follow_latest_moves_window() {
        let mut chart = chart(true);
        fill(&chart, 500);

        let frame = chart.tick().unwrap();
        assert_eq!(frame.mode, DisplayMode::Live);
        assert_eq!(chart.axes().x[0].visual, AxisRange::new(449.0, 499.0));

        let a = chart.last_frame().unwrap().series("A").unwrap();
        assert_eq!(a.points.last().unwrap()[1], 499.0);
    }

    #[test]
    fn test_zoom_pauses_and_reset_resumes_follow() {
        let mut chart = chart(true);
        fill(&chart, 500);
        chart.tick();

        chart.zoom_to(Some(AxisRange::new(100.0, 200.0)), None);
        assert!(!chart.follow_latest());
        let frame = chart.tick().unwrap();
        assert_eq!(frame.mode, DisplayMode::Zoomed);

        assert!(chart.zoom_reset());
        assert!(chart.follow_latest());
        assert_eq!(chart.zoom_depth(), 0);
    }

    #[test]
    fn test_recompute_failure_keeps_last_frame() {
        let mut chart = chart(false);
        fill(&chart, 20);
        chart.tick().unwrap();

        // Misaligned channels: nothing new is drawn
        chart.append("A", 1.0).unwrap();
        assert!(chart.recompute(DisplayMode::WholeRange).is_none());
        assert_eq!(chart.last_frame().unwrap().points_count, 20);
    }

    #[test]
    fn test_auto_set_uses_registry_visibility() {
        let mut chart = chart(false);
        fill(&chart, 11);
        chart.tick().unwrap();
        chart.set_channel_visible("B", false).unwrap();

        let y1_before = chart.axes().y[1];
        assert!(chart.auto_set());
        assert_eq!(chart.axes().y[0].visual, AxisRange::new(0.0, 10.0));
        assert_eq!(chart.axes().y[1], y1_before);
        assert_eq!(chart.zoom_depth(), 1);
    }

    #[test]
    fn test_auto_set_x_margin_survives_ticks() {
        let mut chart = chart(false);
        chart.settings_mut().auto_set_x_margin = 10.0;
        fill(&chart, 101);
        chart.tick().unwrap();

        assert!(chart.auto_set());
        let fitted = AxisRange::new(-10.0, 110.0);
        assert_eq!(chart.axes().x[0].visual, fitted);
        assert_eq!(chart.axes().x[0].whole, fitted);

        assert_eq!(chart.tick().unwrap().mode, DisplayMode::WholeRange);
        assert_eq!(chart.axes().x[0].visual, fitted);
        assert_eq!(chart.axes().x[0].whole, fitted);

        // New data past the fitted range grows the whole range only
        fill(&chart, 100);
        chart.tick().unwrap();
        assert_eq!(chart.axes().x[0].visual, fitted);
        assert_eq!(chart.axes().x[0].whole, AxisRange::new(-10.0, 200.0));

        // Back to tracking the data once the stack is empty
        assert!(chart.zoom_reset());
        chart.tick().unwrap();
        assert_eq!(chart.axes().x[0].visual, AxisRange::new(0.0, 200.0));
    }

    #[test]
    fn test_toggled_off_follow_stays_off_after_reset() {
        let mut chart = chart(true);
        fill(&chart, 500);
        chart.tick();

        assert!(!chart.toggle_follow_latest());
        chart.zoom_to(Some(AxisRange::new(100.0, 200.0)), None);
        assert!(chart.zoom_reset());
        assert!(!chart.follow_latest());

        assert!(chart.toggle_follow_latest());
        chart.zoom_to(Some(AxisRange::new(100.0, 200.0)), None);
        assert!(!chart.follow_latest());
        assert!(chart.zoom_out());
        assert!(chart.follow_latest());
    }

    #[test]
    fn test_auto_set_and_stack_need_a_frame() {
        let mut chart = chart(false);
        assert!(!chart.auto_set());
        assert!(!chart.stack());
        assert!(chart.drain_events().is_empty());
    }

    #[test]
    fn test_stack_emits_events() {
        let mut chart = chart(false);
        fill(&chart, 11);
        chart.tick().unwrap();

        assert!(chart.stack());
        assert_eq!(
            chart.drain_events(),
            vec![ZoomEvent::StackDepthChanged(1), ZoomEvent::RangesChanged]
        );
        assert_eq!(chart.axes().y[0].visual, AxisRange::new(0.0, 20.0));
        assert_eq!(chart.axes().y[1].visual, AxisRange::new(-20.0, 0.0));
    }

    #[test]
    fn test_render_into_sink() {
        let mut chart = chart(false);
        fill(&chart, 30);
        chart.tick().unwrap();

        let mut sink = MockRenderSink::new();
        sink.expect_clear().with(eq("A")).times(1).return_const(());
        sink.expect_clear().with(eq("B")).times(1).return_const(());
        sink.expect_draw_line()
            .with(eq("B"), eq([255u8, 0, 0, 255]), eq(1usize), always())
            .times(1)
            .return_const(());
        sink.expect_draw_line()
            .with(eq("A"), always(), eq(0usize), always())
            .times(1)
            .return_const(());

        assert_eq!(chart.render_into(&mut sink), 2);
    }

    #[test]
    fn test_render_without_frame_draws_nothing() {
        let chart = chart(false);
        let mut sink = MockRenderSink::new();
        sink.expect_clear().never();
        sink.expect_draw_line().never();
        assert_eq!(chart.render_into(&mut sink), 0);
    }

    #[test]
    fn test_visible_statistics() {
        let mut chart = chart(false);
        fill(&chart, 101);
        chart.tick().unwrap();

        let stats = chart.visible_statistics();
        assert_eq!(stats.len(), 2);
        let (name, a) = &stats[0];
        assert_eq!(name, "A");
        assert_eq!(a.min, 0.0);
        assert_eq!(a.max, 100.0);
    }
}

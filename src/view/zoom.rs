//! Zoom history
//!
//! [`ZoomRangeStack`] is a LIFO of [`ZoomFrame`] snapshots. A frame is pushed
//! before every range-changing operation (zoom-in, auto-fit, stacked layout)
//! and popped on zoom-out, so stepping back restores exactly what was on
//! screen before.
//!
//! Each frame captures every X and Y axis. Axes outside the scope of the
//! operation are captured with `enabled = false` and are left alone by a
//! normal pop; popping the last frame restores every axis regardless, which
//! returns the chart to its fully zoomed-out state.
//!
//! Observers learn about changes through [`ZoomEvent`]s sent on a
//! `crossbeam-channel`: at most one `RangesChanged` and one
//! `StackDepthChanged` per public operation. When a bounded queue is full,
//! the pending events are replaced by the current depth and a single
//! `RangesChanged`, so the last depth an observer reads is always current.

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::types::{AxisRange, Extent};
use crate::view::axis::{Axis, AxisSet, SeriesPoints};

/// Which axes an operation intends to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomScope {
    X,
    Y,
    Both,
}

impl ZoomScope {
    pub fn includes_x(self) -> bool {
        matches!(self, ZoomScope::X | ZoomScope::Both)
    }

    pub fn includes_y(self) -> bool {
        matches!(self, ZoomScope::Y | ZoomScope::Both)
    }
}

/// Saved state of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRange {
    pub visual: AxisRange,
    pub whole: AxisRange,
    /// Restored by a normal pop
    pub enabled: bool,
}

impl ViewportRange {
    fn capture(axis: &Axis, enabled: bool) -> Self {
        Self {
            visual: axis.visual,
            whole: axis.whole,
            enabled,
        }
    }

    fn restore(&self, axis: &mut Axis, force: bool) {
        if self.enabled || force {
            axis.visual = self.visual;
            axis.whole = self.whole;
        }
    }
}

/// Snapshot of every axis at the moment of a push
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomFrame {
    pub x_ranges: Vec<ViewportRange>,
    pub y_ranges: Vec<ViewportRange>,
}

impl ZoomFrame {
    /// Capture all axes; axes outside `scope` are marked disabled
    pub fn capture(axes: &AxisSet, scope: ZoomScope) -> Self {
        Self {
            x_ranges: axes
                .x
                .iter()
                .map(|a| ViewportRange::capture(a, scope.includes_x()))
                .collect(),
            y_ranges: axes
                .y
                .iter()
                .map(|a| ViewportRange::capture(a, scope.includes_y()))
                .collect(),
        }
    }

    /// Write the saved ranges back
    ///
    /// Only the prefix shared by the frame and the live axis set is restored;
    /// axes added or removed since the push are left as they are.
    pub fn restore(&self, axes: &mut AxisSet, force: bool) {
        if self.x_ranges.len() != axes.x.len() || self.y_ranges.len() != axes.y.len() {
            tracing::debug!(
                "Zoom frame has {}x/{}y axes, chart has {}x/{}y; restoring common prefix",
                self.x_ranges.len(),
                self.y_ranges.len(),
                axes.x.len(),
                axes.y.len()
            );
        }
        for (saved, axis) in self.x_ranges.iter().zip(axes.x.iter_mut()) {
            saved.restore(axis, force);
        }
        for (saved, axis) in self.y_ranges.iter().zip(axes.y.iter_mut()) {
            saved.restore(axis, force);
        }
    }
}

/// Notification for the render loop and UI indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomEvent {
    /// Axis ranges changed; repaint
    RangesChanged,
    /// Number of frames on the stack after the operation
    StackDepthChanged(usize),
}

/// Both ends of the event queue; the receiver is used to make room on overflow
#[derive(Debug)]
struct EventQueue {
    sender: Sender<ZoomEvent>,
    pending: Receiver<ZoomEvent>,
}

/// LIFO of axis range snapshots
#[derive(Debug, Default)]
pub struct ZoomRangeStack {
    frames: Vec<ZoomFrame>,
    events: Option<EventQueue>,
}

impl ZoomRangeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish events on `sender`
    ///
    /// `pending` is a clone of the receiving end of the same channel. A bounded
    /// queue needs room for two events.
    pub fn with_events(mut self, sender: Sender<ZoomEvent>, pending: Receiver<ZoomEvent>) -> Self {
        self.events = Some(EventQueue { sender, pending });
        self
    }

    /// Number of saved frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Saved frames, bottom first
    pub fn frames(&self) -> &[ZoomFrame] {
        &self.frames
    }

    fn notify(&self, event: ZoomEvent) {
        let Some(queue) = &self.events else {
            return;
        };
        match queue.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.coalesce(queue),
            Err(TrySendError::Disconnected(_)) => {
                tracing::trace!("No zoom event listener for {:?}", event);
            }
        }
    }

    /// Replace everything queued with the current state
    fn coalesce(&self, queue: &EventQueue) {
        let dropped = queue.pending.try_iter().count();
        tracing::trace!(
            "Zoom event queue full, coalesced {} events at depth {}",
            dropped,
            self.depth()
        );
        for event in [ZoomEvent::StackDepthChanged(self.depth()), ZoomEvent::RangesChanged] {
            if queue.sender.try_send(event).is_err() {
                tracing::trace!("No room for {:?} after coalescing", event);
                break;
            }
        }
    }

    fn push_frame(&mut self, axes: &AxisSet, scope: ZoomScope) {
        self.frames.push(ZoomFrame::capture(axes, scope));
    }

    /// Remove the top frame and restore its enabled axes
    ///
    /// Returns false if the stack was empty.
    fn pop_frame(&mut self, axes: &mut AxisSet) -> bool {
        let Some(frame) = self.frames.pop() else {
            return false;
        };
        frame.restore(axes, self.frames.is_empty());
        true
    }

    /// Save the current ranges before a change limited to `scope`
    pub fn push(&mut self, axes: &AxisSet, scope: ZoomScope) {
        self.push_frame(axes, scope);
        tracing::debug!("Zoom push ({:?}), depth {}", scope, self.depth());
        self.notify(ZoomEvent::StackDepthChanged(self.depth()));
    }

    /// Step back one zoom level
    ///
    /// Empty stack is a no-op. Returns true if a frame was restored.
    pub fn pop(&mut self, axes: &mut AxisSet) -> bool {
        if !self.pop_frame(axes) {
            return false;
        }
        tracing::debug!("Zoom pop, depth {}", self.depth());
        self.notify(ZoomEvent::StackDepthChanged(self.depth()));
        self.notify(ZoomEvent::RangesChanged);
        true
    }

    /// Alias for a single [`pop`](Self::pop)
    pub fn out(&mut self, axes: &mut AxisSet) -> bool {
        self.pop(axes)
    }

    /// Return to the state before the first push
    ///
    /// Calling reset on an empty stack is a no-op.
    pub fn reset(&mut self, axes: &mut AxisSet) -> bool {
        if self.frames.is_empty() {
            return false;
        }
        while self.frames.len() > 1 {
            self.pop_frame(axes);
        }
        self.pop_frame(axes);
        tracing::debug!("Zoom reset");
        self.notify(ZoomEvent::StackDepthChanged(0));
        self.notify(ZoomEvent::RangesChanged);
        true
    }

    /// Zoom to explicit ranges
    ///
    /// `x` applies to the primary X axis; `y[i]` applies to Y axis `i`. The
    /// pushed frame only enables the axis kinds that are actually changed.
    pub fn zoom_to(&mut self, axes: &mut AxisSet, x: Option<AxisRange>, y: Option<&[AxisRange]>) {
        let scope = match (x.is_some(), y.is_some()) {
            (true, true) => ZoomScope::Both,
            (true, false) => ZoomScope::X,
            (false, true) => ZoomScope::Y,
            (false, false) => return,
        };

        self.push_frame(axes, scope);
        if let (Some(range), Some(axis)) = (x, axes.primary_x_mut()) {
            axis.visual = range;
        }
        if let Some(ranges) = y {
            for (axis, range) in axes.y.iter_mut().zip(ranges) {
                axis.visual = *range;
            }
        }

        tracing::debug!("Zoom to {:?}/{:?}, depth {}", x, y, self.depth());
        self.notify(ZoomEvent::StackDepthChanged(self.depth()));
        self.notify(ZoomEvent::RangesChanged);
    }

    /// Fit every axis to the data of its visible series
    ///
    /// Margins are percentages of the data span added on both ends. A Y axis
    /// with no finite samples is left unchanged; the same applies to X axes.
    pub fn auto_set<'a>(
        &mut self,
        axes: &mut AxisSet,
        series: impl IntoIterator<Item = SeriesPoints<'a>>,
        x_margin: f64,
        y_margin: f64,
    ) {
        let series: Vec<SeriesPoints<'a>> = series.into_iter().filter(|s| s.visible).collect();
        self.push_frame(axes, ZoomScope::Both);

        for (i, axis) in axes.x.iter_mut().enumerate() {
            let extent = axis_extent(&series, |s| s.x_axis == i, 0);
            if let Some(range) = extent.range() {
                axis.set_range(range.expanded_by_percent(x_margin));
            }
        }
        for (i, axis) in axes.y.iter_mut().enumerate() {
            let extent = axis_extent(&series, |s| s.y_axis == i, 1);
            match extent.range() {
                Some(range) => axis.set_range(range.expanded_by_percent(y_margin)),
                None => tracing::trace!("Auto-set skipped Y axis {} (no data)", i),
            }
        }

        tracing::debug!("Auto-set ranges, depth {}", self.depth());
        self.notify(ZoomEvent::StackDepthChanged(self.depth()));
        self.notify(ZoomEvent::RangesChanged);
    }

    /// Lay out Y axes in disjoint horizontal bands
    ///
    /// With `n` Y axes, axis `i` gets `[min - i*span, max + (n-1-i)*span]`, so
    /// its data occupies band `i` (counted from the bottom) of the shared plot
    /// height. Axes whose data has zero span keep their ranges.
    pub fn stack<'a>(
        &mut self,
        axes: &mut AxisSet,
        series: impl IntoIterator<Item = SeriesPoints<'a>>,
    ) {
        let series: Vec<SeriesPoints<'a>> = series.into_iter().filter(|s| s.visible).collect();
        self.push_frame(axes, ZoomScope::Y);

        let n = axes.y.len();
        for (i, axis) in axes.y.iter_mut().enumerate() {
            let Some(data) = axis_extent(&series, |s| s.y_axis == i, 1).range() else {
                continue;
            };
            let span = data.span();
            if span <= 0.0 {
                continue;
            }
            axis.set_range(AxisRange::new(
                data.min - i as f64 * span,
                data.max + (n - 1 - i) as f64 * span,
            ));
        }

        tracing::debug!("Stacked {} Y axes, depth {}", n, self.depth());
        self.notify(ZoomEvent::StackDepthChanged(self.depth()));
        self.notify(ZoomEvent::RangesChanged);
    }
}

/// Min/max of one coordinate over the series selected by `belongs`
fn axis_extent(
    series: &[SeriesPoints<'_>],
    belongs: impl Fn(&SeriesPoints<'_>) -> bool,
    coordinate: usize,
) -> Extent {
    let mut extent = Extent::default();
    for s in series.iter().filter(|s| belongs(*s)) {
        for p in s.points {
            extent.include(p[coordinate]);
        }
    }
    extent
}

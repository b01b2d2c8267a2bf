//! Channel registry shared between the acquisition and render threads
//!
//! A [`SeriesRegistry`] owns every [`ChannelSeries`] behind one coarse
//! [`Mutex`]. The producer appends and the render loop decimates under the
//! same lock, so a decimation pass always sees every channel at the same
//! sample count.
//!
//! All channels share one sample index space: sample `k` of every channel was
//! taken at `k * base_period`. The registry keeps this true:
//!
//! - channels registered after samples have arrived are back-filled with NaN
//!   gap samples up to the current [`SeriesSet::points_count`]
//! - [`SeriesSet::append_frame`] appends one value to every channel at once
//! - [`SeriesSet::check_aligned`] reports the first channel whose length
//!   differs from the leading channel
//!
//! Per-channel appends remain available for producers that fill one channel
//! at a time inside a single [`SeriesRegistry::lock`] scope.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::chunked::ChunkedBuffer;
use crate::error::{Result, StreamPlotError};
use crate::types::{channel_color, Rgba};

/// Default number of samples per buffer chunk
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// One named, colored channel of samples
#[derive(Debug, Clone)]
pub struct ChannelSeries {
    name: String,
    color: Rgba,
    visible: bool,
    y_axis: usize,
    buffer: ChunkedBuffer<f64>,
}

impl ChannelSeries {
    /// Create an empty channel
    pub fn new(name: impl Into<String>, color: Rgba, chunk_size: usize) -> Self {
        Self {
            name: name.into(),
            color,
            visible: true,
            y_axis: 0,
            buffer: ChunkedBuffer::new(chunk_size),
        }
    }

    /// Unique channel name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display color
    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Set the display color
    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    /// Whether the channel is currently shown
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the channel
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Y axis this channel is plotted against (0 = primary)
    pub fn y_axis(&self) -> usize {
        self.y_axis
    }

    /// Assign the channel to a Y axis
    pub fn set_y_axis(&mut self, axis: usize) {
        self.y_axis = axis;
    }

    /// Sample storage
    pub fn buffer(&self) -> &ChunkedBuffer<f64> {
        &self.buffer
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if the channel holds no samples
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// The lock-protected contents of a [`SeriesRegistry`]
#[derive(Debug, Default)]
pub struct SeriesSet {
    chunk_size: usize,
    channels: Vec<ChannelSeries>,
    index: HashMap<String, usize>,
}

impl SeriesSet {
    fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            channels: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a channel with an explicit color
    ///
    /// Returns the channel's position. If other channels already hold
    /// samples, the new channel is back-filled with NaN so every channel keeps
    /// the same length.
    pub fn add_channel(&mut self, name: impl Into<String>, color: Rgba) -> Result<usize> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(StreamPlotError::DuplicateChannel(name));
        }

        let mut series = ChannelSeries::new(name.clone(), color, self.chunk_size);
        let backfill = self.points_count();
        if backfill > 0 {
            series.buffer.add_range(&vec![f64::NAN; backfill]);
            tracing::debug!("Back-filled channel '{}' with {} gap samples", name, backfill);
        }

        let position = self.channels.len();
        self.channels.push(series);
        self.index.insert(name, position);
        Ok(position)
    }

    /// Register a channel with an automatically assigned color
    pub fn add_channel_auto(&mut self, name: impl Into<String>) -> Result<usize> {
        let color = channel_color(self.channels.len());
        self.add_channel(name, color)
    }

    /// Remove a channel by name
    pub fn remove_channel(&mut self, name: &str) -> Result<ChannelSeries> {
        let position = self
            .index
            .remove(name)
            .ok_or_else(|| StreamPlotError::UnknownChannel(name.to_string()))?;
        let removed = self.channels.remove(position);
        self.reindex();
        Ok(removed)
    }

    fn reindex(&mut self) {
        self.index = self
            .channels
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
    }

    /// Drop every channel and its samples
    pub fn clear(&mut self) {
        self.channels.clear();
        self.index.clear();
    }

    /// Empty every channel's buffer, keeping the channels themselves
    pub fn clear_points(&mut self) {
        for channel in &mut self.channels {
            channel.buffer.clear();
        }
    }

    /// Sample count of the leading channel (0 when no channels exist)
    pub fn points_count(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Verify that every channel has the leading channel's length
    ///
    /// Returns the shared sample count.
    pub fn check_aligned(&self) -> Result<usize> {
        let expected = self.points_count();
        match self.channels.iter().find(|c| c.len() != expected) {
            Some(channel) => Err(StreamPlotError::ChannelLengthMismatch {
                channel: channel.name.clone(),
                expected,
                actual: channel.len(),
            }),
            None => Ok(expected),
        }
    }

    /// Number of registered channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if no channels are registered
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channel by position
    pub fn get(&self, position: usize) -> Option<&ChannelSeries> {
        self.channels.get(position)
    }

    /// Mutable channel by position
    pub fn get_mut(&mut self, position: usize) -> Option<&mut ChannelSeries> {
        self.channels.get_mut(position)
    }

    /// Position of a channel by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Channel by name
    pub fn by_name(&self, name: &str) -> Option<&ChannelSeries> {
        self.position(name).and_then(|i| self.channels.get(i))
    }

    /// Mutable channel by name
    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut ChannelSeries> {
        let position = self.position(name)?;
        self.channels.get_mut(position)
    }

    /// Iterate channels in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ChannelSeries> {
        self.channels.iter()
    }

    fn channel_mut(&mut self, name: &str) -> Result<&mut ChannelSeries> {
        let position = self
            .position(name)
            .ok_or_else(|| StreamPlotError::UnknownChannel(name.to_string()))?;
        Ok(&mut self.channels[position])
    }

    /// Append one sample to a single channel
    pub fn append(&mut self, name: &str, value: f64) -> Result<()> {
        self.channel_mut(name)?.buffer.add(value);
        Ok(())
    }

    /// Append a batch of samples to a single channel
    pub fn append_range(&mut self, name: &str, values: &[f64]) -> Result<()> {
        self.channel_mut(name)?.buffer.add_range(values);
        Ok(())
    }

    /// Append one sample to every channel, in registration order
    pub fn append_frame(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.channels.len() {
            return Err(StreamPlotError::ChannelCountMismatch {
                expected: self.channels.len(),
                actual: values.len(),
            });
        }
        for (channel, &value) in self.channels.iter_mut().zip(values) {
            channel.buffer.add(value);
        }
        Ok(())
    }

    /// Append a block of frames; `columns[i]` holds the samples of channel `i`
    pub fn append_columns(&mut self, columns: &[&[f64]]) -> Result<()> {
        if columns.len() != self.channels.len() {
            return Err(StreamPlotError::ChannelCountMismatch {
                expected: self.channels.len(),
                actual: columns.len(),
            });
        }
        if let Some(first) = columns.first() {
            if let Some((i, column)) = columns
                .iter()
                .enumerate()
                .find(|(_, c)| c.len() != first.len())
            {
                return Err(StreamPlotError::ChannelLengthMismatch {
                    channel: self.channels[i].name.clone(),
                    expected: first.len(),
                    actual: column.len(),
                });
            }
        }
        for (channel, column) in self.channels.iter_mut().zip(columns) {
            channel.buffer.add_range(column);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SeriesSet {
    type Item = &'a ChannelSeries;
    type IntoIter = std::slice::Iter<'a, ChannelSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.iter()
    }
}

/// Scoped access to a locked [`SeriesSet`]
///
/// The lock is released when the guard drops, including on early return and
/// unwinding.
pub struct RegistryGuard<'a> {
    guard: MutexGuard<'a, SeriesSet>,
    base_period: f64,
}

impl RegistryGuard<'_> {
    /// Time units per sample
    pub fn base_period(&self) -> f64 {
        self.base_period
    }

    /// Time of sample `index`
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.base_period
    }
}

impl Deref for RegistryGuard<'_> {
    type Target = SeriesSet;

    fn deref(&self) -> &SeriesSet {
        &self.guard
    }
}

impl DerefMut for RegistryGuard<'_> {
    fn deref_mut(&mut self) -> &mut SeriesSet {
        &mut self.guard
    }
}

/// Ordered, name-indexed collection of channels sharing one lock and one
/// sample period
#[derive(Debug)]
pub struct SeriesRegistry {
    base_period: f64,
    chunk_size: usize,
    inner: Mutex<SeriesSet>,
}

impl SeriesRegistry {
    /// Create an empty registry
    ///
    /// `base_period` is the time covered by one sample and must be finite and
    /// positive.
    pub fn new(base_period: f64, chunk_size: usize) -> Result<Self> {
        if !(base_period.is_finite() && base_period > 0.0) {
            return Err(StreamPlotError::InvalidPeriod(base_period));
        }
        let chunk_size = chunk_size.max(1);
        tracing::debug!(
            "Created series registry (period {}, chunk size {})",
            base_period,
            chunk_size
        );
        Ok(Self {
            base_period,
            chunk_size,
            inner: Mutex::new(SeriesSet::new(chunk_size)),
        })
    }

    /// Time units per sample
    pub fn base_period(&self) -> f64 {
        self.base_period
    }

    /// Samples per buffer chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Acquire the registry lock
    ///
    /// A poisoned lock is recovered: the protected data is append-only and
    /// stays structurally valid if a holder panicked.
    pub fn lock(&self) -> RegistryGuard<'_> {
        let guard = self.inner.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::warn!("Series registry lock was poisoned, recovering");
            poisoned.into_inner()
        });
        RegistryGuard {
            guard,
            base_period: self.base_period,
        }
    }

    /// Register a channel with an explicit color
    pub fn add_channel(&self, name: impl Into<String>, color: Rgba) -> Result<usize> {
        self.lock().add_channel(name, color)
    }

    /// Register a channel with an automatically assigned color
    pub fn add_channel_auto(&self, name: impl Into<String>) -> Result<usize> {
        self.lock().add_channel_auto(name)
    }

    /// Remove a channel by name
    pub fn remove_channel(&self, name: &str) -> Result<ChannelSeries> {
        self.lock().remove_channel(name)
    }

    /// Append one sample to a single channel
    pub fn append(&self, name: &str, value: f64) -> Result<()> {
        self.lock().append(name, value)
    }

    /// Append a batch of samples to a single channel
    pub fn append_range(&self, name: &str, values: &[f64]) -> Result<()> {
        self.lock().append_range(name, values)
    }

    /// Append one sample to every channel
    pub fn append_frame(&self, values: &[f64]) -> Result<()> {
        self.lock().append_frame(values)
    }

    /// Sample count of the leading channel
    pub fn points_count(&self) -> usize {
        self.lock().points_count()
    }

    /// Number of registered channels
    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }

    /// Drop every channel
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Empty every channel's buffer
    pub fn clear_points(&self) {
        self.lock().clear_points();
    }
}

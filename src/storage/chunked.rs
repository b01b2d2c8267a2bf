//! Chunked append-only buffer
//!
//! [`ChunkedBuffer`] stores an unbounded sample stream as a list of
//! fixed-length chunks plus a write cursor. Growing the buffer only ever
//! allocates a new chunk; previously written chunks are never moved or copied,
//! which keeps append cost flat while a channel accumulates millions of
//! samples.
//!
//! Invariants:
//! - there is always at least one chunk
//! - every chunk except the last is completely full
//! - `len() == (chunks - 1) * chunk_size + position`
//!
//! The buffer itself is not synchronized. Inside the engine it always lives
//! behind the [`SeriesRegistry`](super::SeriesRegistry) lock.

use crate::error::{Result, StreamPlotError};
use crate::types::Extent;

/// Growable, fixed-chunk-size append-only sequence
#[derive(Debug, Clone)]
pub struct ChunkedBuffer<T> {
    chunks: Vec<Box<[T]>>,
    chunk_size: usize,
    /// Write position inside the last chunk
    position: usize,
}

impl<T: Copy + Default> ChunkedBuffer<T> {
    /// Create an empty buffer with one unfilled chunk
    ///
    /// A `chunk_size` of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunks: vec![Self::alloc_chunk(chunk_size)],
            chunk_size,
            position: 0,
        }
    }

    fn alloc_chunk(chunk_size: usize) -> Box<[T]> {
        vec![T::default(); chunk_size].into_boxed_slice()
    }

    /// Number of elements per chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of allocated chunks (always at least one)
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of populated elements
    #[inline]
    pub fn len(&self) -> usize {
        (self.chunks.len() - 1) * self.chunk_size + self.position
    }

    /// True if nothing has been appended since creation or the last clear
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a fresh chunk if the current one is full
    #[inline]
    fn ensure_space(&mut self) {
        if self.position == self.chunk_size {
            self.chunks.push(Self::alloc_chunk(self.chunk_size));
            self.position = 0;
        }
    }

    #[inline]
    fn current_chunk_mut(&mut self) -> &mut [T] {
        let last = self.chunks.len() - 1;
        &mut self.chunks[last]
    }

    /// Append one element
    pub fn add(&mut self, value: T) {
        self.ensure_space();
        let position = self.position;
        self.current_chunk_mut()[position] = value;
        self.position += 1;
    }

    /// Append a contiguous run of elements, splitting it across chunks
    pub fn add_range(&mut self, values: &[T]) {
        let mut rest = values;
        while !rest.is_empty() {
            self.ensure_space();
            let position = self.position;
            let n = (self.chunk_size - position).min(rest.len());
            self.current_chunk_mut()[position..position + n].copy_from_slice(&rest[..n]);
            self.position += n;
            rest = &rest[n..];
        }
    }

    /// Random read of a single element
    pub fn get(&self, index: usize) -> Result<T> {
        let chunk = index / self.chunk_size;
        let offset = index % self.chunk_size;
        let last = self.chunks.len() - 1;

        if chunk > last || (chunk == last && offset >= self.position) {
            return Err(StreamPlotError::OutOfRange {
                index,
                len: self.len(),
            });
        }

        Ok(self.chunks[chunk][offset])
    }

    /// Last appended element
    pub fn last(&self) -> Option<T> {
        self.len().checked_sub(1).and_then(|i| self.get(i).ok())
    }

    /// Iterate over all populated elements in order
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let last = self.chunks.len() - 1;
        let position = self.position;
        self.chunks.iter().enumerate().flat_map(move |(i, chunk)| {
            let end = if i == last { position } else { chunk.len() };
            chunk[..end].iter().copied()
        })
    }

    /// Materialize the whole sequence into one contiguous vector
    pub fn to_vec(&self) -> Result<Vec<T>> {
        if self.is_empty() {
            return Err(StreamPlotError::Empty("buffer has no samples"));
        }

        let mut out = Vec::with_capacity(self.len());
        let last = self.chunks.len() - 1;
        for (i, chunk) in self.chunks.iter().enumerate() {
            if i == last {
                out.extend_from_slice(&chunk[..self.position]);
            } else {
                out.extend_from_slice(chunk);
            }
        }
        Ok(out)
    }

    /// Sample `count` elements at `start, start + step, start + 2*step, ...`
    ///
    /// Any index past the populated range is an error.
    pub fn to_vec_strided(&self, start: usize, step: usize, count: usize) -> Result<Vec<T>> {
        if self.is_empty() {
            return Err(StreamPlotError::Empty("buffer has no samples"));
        }
        if count == 0 {
            return Err(StreamPlotError::Empty("requested zero samples"));
        }

        (0..count).map(|i| self.get(start + i * step)).collect()
    }

    /// Sample `count` elements at `start + round(i * step)` for a real `step`
    ///
    /// Indices past the populated range repeat the previous output value
    /// (edge-hold), so a caller's estimate of the visible extent may overshoot
    /// the data by a few samples. The first index must be populated.
    pub fn to_vec_fractional(&self, start: usize, step: f64, count: usize) -> Result<Vec<T>> {
        if self.is_empty() {
            return Err(StreamPlotError::Empty("buffer has no samples"));
        }
        if count == 0 {
            return Err(StreamPlotError::Empty("requested zero samples"));
        }

        let len = self.len();
        let step = step.max(0.0);
        let mut held = self.get(start)?;
        let mut out = Vec::with_capacity(count);

        for i in 0..count {
            let index = start.saturating_add((i as f64 * step).round() as usize);
            if index < len {
                held = self.chunks[index / self.chunk_size][index % self.chunk_size];
            }
            out.push(held);
        }

        Ok(out)
    }

    /// Drop every chunk and start over with one empty chunk
    ///
    /// `chunk_size` is unchanged.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.chunks.push(Self::alloc_chunk(self.chunk_size));
        self.position = 0;
    }
}

impl ChunkedBuffer<f64> {
    /// Minimum and maximum over all finite samples
    pub fn extent(&self) -> Extent {
        let mut extent = Extent::default();
        for value in self.iter() {
            extent.include(value);
        }
        extent
    }
}

//! Sample storage
//!
//! - [`ChunkedBuffer`] - append-only sequence built from fixed-size chunks
//! - [`ChannelSeries`] - one named, colored channel of samples
//! - [`SeriesRegistry`] - all channels behind one lock and one sample period

pub mod chunked;
pub mod registry;

pub use chunked::ChunkedBuffer;
pub use registry::{
    ChannelSeries, RegistryGuard, SeriesRegistry, SeriesSet, DEFAULT_CHUNK_SIZE,
};

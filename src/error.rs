//! Error handling for streamplot-rs
//!
//! This module defines the crate error type and a Result alias for use
//! throughout the engine. Buffer and registry errors propagate to the
//! downsampler, which is the recovery boundary for the render path.

use thiserror::Error;

/// Main error type for streamplot-rs operations
#[derive(Error, Debug)]
pub enum StreamPlotError {
    /// Index outside the populated part of a buffer
    #[error("Index {index} out of range (length {len})")]
    OutOfRange { index: usize, len: usize },

    /// Materialization or decimation requested on an empty buffer
    #[error("Empty: {0}")]
    Empty(&'static str),

    /// A channel with this name is already registered
    #[error("Channel '{0}' already exists")]
    DuplicateChannel(String),

    /// No channel with this name is registered
    #[error("Unknown channel '{0}'")]
    UnknownChannel(String),

    /// A frame append supplied the wrong number of values
    #[error("Expected {expected} values (one per channel), got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },

    /// Channels no longer share the same sample index space
    #[error("Channel '{channel}' has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: String,
        expected: usize,
        actual: usize,
    },

    /// Sample period must be finite and positive
    #[error("Invalid base period: {0}")]
    InvalidPeriod(f64),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StreamPlotError>,
    },
}

impl StreamPlotError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StreamPlotError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &StreamPlotError {
        match self {
            StreamPlotError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for StreamPlotError {
    fn from(err: serde_json::Error) -> Self {
        StreamPlotError::Serialization(err.to_string())
    }
}

/// Result type alias for streamplot-rs operations
pub type Result<T> = std::result::Result<T, StreamPlotError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

//! Configuration module for streamplot-rs
//!
//! This module handles persistent chart configuration:
//! - Sample storage (base period, chunk size)
//! - View defaults (pixel width, live window, refresh rate)
//! - Zoom behaviour (auto-set margins, event queue capacity)
//! - Logging (filter directive, optional log directory)
//! - Demo channels for the headless binary
//!
//! Runtime state that changes while the chart is running lives in
//! [`settings`].
//!
//! # Config Location
//!
//! The default config file is stored in the platform-appropriate location:
//! - **Linux**: `~/.config/dev.streamplot.streamplot-rs/streamplot.json`
//! - **macOS**: `~/Library/Application Support/dev.streamplot.streamplot-rs/streamplot.json`
//! - **Windows**: `%APPDATA%\dev.streamplot.streamplot-rs\streamplot.json`
//!
//! # Example
//!
//! ```ignore
//! use streamplot_rs::config::ChartConfig;
//!
//! let mut config = ChartConfig::load_or_default(ChartConfig::default_path()?);
//! config.view.pixel_width = 1200;
//! config.save("streamplot.json")?;
//! ```

pub mod settings;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt, StreamPlotError};
use crate::signal::SignalPattern;
use crate::storage::DEFAULT_CHUNK_SIZE;
use crate::types::Rgba;

/// Application identifier for config storage
pub const APP_ID: &str = "dev.streamplot.streamplot-rs";

/// Config file name
const CONFIG_FILE: &str = "streamplot.json";

/// Current config format version
const CONFIG_VERSION: u32 = 1;

/// Get the platform-specific config directory for streamplot-rs
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Path of the default config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Complete chart configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartConfig {
    /// Config format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Sample storage
    #[serde(default)]
    pub buffer: BufferConfig,

    /// View defaults
    #[serde(default)]
    pub view: ViewConfig,

    /// Zoom behaviour
    #[serde(default)]
    pub zoom: ZoomConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Demo acquisition
    #[serde(default)]
    pub demo: DemoConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            buffer: BufferConfig::default(),
            view: ViewConfig::default(),
            zoom: ZoomConfig::default(),
            logging: LoggingConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl ChartConfig {
    /// Default config location, if the platform has a config directory
    pub fn default_path() -> Result<PathBuf> {
        default_config_path().ok_or_else(|| {
            StreamPlotError::Config("Could not determine config directory".to_string())
        })
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(StreamPlotError::from)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(StreamPlotError::from)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save as pretty JSON, creating the parent directory if needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(StreamPlotError::from)
                    .context("Failed to create config directory")?;
            }
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(StreamPlotError::from)
            .context("Failed to serialize config")?;

        std::fs::write(path, content)
            .map_err(StreamPlotError::from)
            .with_context(|| format!("Failed to write config file {:?}", path))
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let period = self.buffer.base_period;
        if !period.is_finite() || period <= 0.0 {
            return Err(StreamPlotError::InvalidPeriod(period));
        }
        if self.buffer.chunk_size == 0 {
            return Err(StreamPlotError::Config(
                "buffer.chunk_size must be at least 1".to_string(),
            ));
        }
        if !self.view.live_window.is_finite() || self.view.live_window <= 0.0 {
            return Err(StreamPlotError::Config(format!(
                "view.live_window must be positive, got {}",
                self.view.live_window
            )));
        }
        if self.zoom.event_capacity < 2 {
            return Err(StreamPlotError::Config(format!(
                "zoom.event_capacity must be at least 2, got {}",
                self.zoom.event_capacity
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for channel in &self.demo.channels {
            if !seen.insert(channel.name.as_str()) {
                return Err(StreamPlotError::Config(format!(
                    "Duplicate demo channel '{}'",
                    channel.name
                )));
            }
        }
        Ok(())
    }
}

/// Sample storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BufferConfig {
    /// Time between consecutive samples in seconds
    #[serde(default = "default_base_period")]
    pub base_period: f64,

    /// Samples per storage chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_base_period() -> f64 {
    0.001
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            base_period: default_base_period(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// View defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewConfig {
    /// Plot width in pixels, the decimation budget
    #[serde(default = "default_pixel_width")]
    pub pixel_width: usize,

    /// Start in follow-latest mode
    #[serde(default = "default_true")]
    pub follow_latest: bool,

    /// Width of the follow-latest window in seconds
    #[serde(default = "default_live_window")]
    pub live_window: f64,

    /// Render ticks per second
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: u32,
}

fn default_pixel_width() -> usize {
    800
}

fn default_true() -> bool {
    true
}

fn default_live_window() -> f64 {
    10.0
}

fn default_refresh_hz() -> u32 {
    30
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            pixel_width: default_pixel_width(),
            follow_latest: true,
            live_window: default_live_window(),
            refresh_hz: default_refresh_hz(),
        }
    }
}

/// Zoom behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoomConfig {
    /// Margin added to both X ends by auto-set, percent of the data span
    #[serde(default)]
    pub auto_set_x_margin: f64,

    /// Margin added to both Y ends by auto-set, percent of the data span
    #[serde(default = "default_y_margin")]
    pub auto_set_y_margin: f64,

    /// Capacity of the zoom event queue
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_y_margin() -> f64 {
    5.0
}

fn default_event_capacity() -> usize {
    64
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            auto_set_x_margin: 0.0,
            auto_set_y_margin: default_y_margin(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    #[serde(default)]
    pub filter: Option<String>,

    /// Directory for daily-rolling log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// One generated channel of the demo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemoChannel {
    pub name: String,

    /// Explicit color; generated from the channel index when absent
    #[serde(default)]
    pub color: Option<Rgba>,

    /// Y axis the channel is drawn against
    #[serde(default)]
    pub y_axis: usize,

    #[serde(default)]
    pub pattern: SignalPattern,

    /// Uniform noise amplitude
    #[serde(default)]
    pub noise: f64,
}

impl DemoChannel {
    pub fn new(name: impl Into<String>, pattern: SignalPattern) -> Self {
        Self {
            name: name.into(),
            color: None,
            y_axis: 0,
            pattern,
            noise: 0.0,
        }
    }

    pub fn on_axis(mut self, y_axis: usize) -> Self {
        self.y_axis = y_axis;
        self
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }
}

/// Demo acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemoConfig {
    #[serde(default = "default_demo_channels")]
    pub channels: Vec<DemoChannel>,

    /// How long the headless demo runs
    #[serde(default = "default_duration_secs")]
    pub duration_secs: f64,

    /// Samples appended per producer batch
    #[serde(default = "default_samples_per_batch")]
    pub samples_per_batch: usize,
}

fn default_demo_channels() -> Vec<DemoChannel> {
    vec![
        DemoChannel::new(
            "sine",
            SignalPattern::Sine {
                frequency: 0.5,
                amplitude: 1.0,
                offset: 0.0,
            },
        )
        .with_noise(0.05),
        DemoChannel::new(
            "square",
            SignalPattern::Square {
                period: 2.0,
                amplitude: 1.0,
            },
        ),
        DemoChannel::new(
            "ramp",
            SignalPattern::Sawtooth {
                period: 5.0,
                amplitude: 100.0,
            },
        )
        .on_axis(1),
    ]
}

fn default_duration_secs() -> f64 {
    5.0
}

fn default_samples_per_batch() -> usize {
    50
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            channels: default_demo_channels(),
            duration_secs: default_duration_secs(),
            samples_per_batch: default_samples_per_batch(),
        }
    }
}

impl DemoConfig {
    /// Number of Y axes the demo channels need
    pub fn y_axis_count(&self) -> usize {
        self.channels
            .iter()
            .map(|c| c.y_axis + 1)
            .max()
            .unwrap_or(1)
    }
}

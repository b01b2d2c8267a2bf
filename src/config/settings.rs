//! Runtime settings that can be modified while the chart is running
//!
//! These are seeded from [`ChartConfig`](super::ChartConfig) and then owned
//! by the [`LiveChart`](crate::chart::LiveChart); they are never written back
//! to the config file.

use serde::{Deserialize, Serialize};

use super::ChartConfig;

/// Smallest follow-latest window in seconds
const MIN_LIVE_WINDOW: f64 = 1e-6;

/// Runtime view settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeSettings {
    /// Whether the X window tracks the newest sample
    pub follow_latest: bool,

    /// Width of the follow-latest window in seconds
    pub live_window: f64,

    /// Upper limit for `live_window`
    pub max_live_window: f64,

    /// Plot width in pixels
    pub pixel_width: usize,

    /// Auto-set X margin in percent
    pub auto_set_x_margin: f64,

    /// Auto-set Y margin in percent
    pub auto_set_y_margin: f64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self::from_config(&ChartConfig::default())
    }
}

impl RuntimeSettings {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            follow_latest: config.view.follow_latest,
            live_window: config.view.live_window,
            max_live_window: 300.0_f64.max(config.view.live_window),
            pixel_width: config.view.pixel_width,
            auto_set_x_margin: config.zoom.auto_set_x_margin,
            auto_set_y_margin: config.zoom.auto_set_y_margin,
        }
    }

    /// Set the live window, clamped to `[MIN_LIVE_WINDOW, max_live_window]`
    pub fn set_live_window(&mut self, window: f64) {
        self.live_window = window.clamp(MIN_LIVE_WINDOW, self.max_live_window);
    }
}

//! Statistics over the visible window
//!
//! Computed on decimated points, so the cost is bounded by the pixel budget
//! rather than by the number of stored samples. Gap samples (NaN) are skipped.

use crate::types::PlotPoint;

/// Statistics for one channel over a time window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Root mean square
    pub rms: f64,
    /// Number of points that contributed
    pub count: usize,
    pub time_start: f64,
    pub time_end: f64,
}

impl RangeStatistics {
    /// Statistics of the points whose time lies in `[time_start, time_end]`
    pub fn from_points(points: &[PlotPoint], time_start: f64, time_end: f64) -> Self {
        let values: Vec<f64> = points
            .iter()
            .filter(|p| p[0] >= time_start && p[0] <= time_end && p[1].is_finite())
            .map(|p| p[1])
            .collect();

        if values.is_empty() {
            return Self {
                time_start,
                time_end,
                ..Default::default()
            };
        }

        let count = values.len();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / count as f64;

        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let rms = (values.iter().map(|v| v * v).sum::<f64>() / count as f64).sqrt();

        Self {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
            rms,
            count,
            time_start,
            time_end,
        }
    }

    pub fn peak_to_peak(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_valid(&self) -> bool {
        self.count > 0
    }
}

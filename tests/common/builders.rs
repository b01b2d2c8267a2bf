//! Test data builders for registries and charts

use std::sync::Arc;
use streamplot_rs::{ChartConfig, LiveChart, SeriesRegistry};

/// Builder for a registry pre-filled with frames
///
/// Channel `c` holds `(i * (c + 1)) as f64` at sample `i`, so every value
/// identifies both its channel and its index.
pub struct RegistryBuilder {
    base_period: f64,
    chunk_size: usize,
    channels: Vec<String>,
    samples: usize,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            base_period: 1.0,
            chunk_size: 128,
            channels: Vec::new(),
            samples: 0,
        }
    }

    pub fn base_period(mut self, base_period: f64) -> Self {
        self.base_period = base_period;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn channel(mut self, name: &str) -> Self {
        self.channels.push(name.to_string());
        self
    }

    pub fn samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn build(self) -> Arc<SeriesRegistry> {
        let registry = Arc::new(SeriesRegistry::new(self.base_period, self.chunk_size).unwrap());
        for name in &self.channels {
            registry.add_channel_auto(name.as_str()).unwrap();
        }
        let mut frame = vec![0.0; self.channels.len()];
        for i in 0..self.samples {
            for (c, value) in frame.iter_mut().enumerate() {
                *value = (i * (c + 1)) as f64;
            }
            registry.append_frame(&frame).unwrap();
        }
        registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Chart config with a 1 s sample period and a small pixel budget
pub fn test_config(pixel_width: usize, follow_latest: bool) -> ChartConfig {
    let mut config = ChartConfig::default();
    config.buffer.base_period = 1.0;
    config.buffer.chunk_size = 64;
    config.view.pixel_width = pixel_width;
    config.view.follow_latest = follow_latest;
    config.view.live_window = 100.0;
    config.zoom.auto_set_y_margin = 0.0;
    config.demo.channels.clear();
    config
}

/// Chart with channels on the given Y axes
pub fn chart_with(config: &ChartConfig, channels: &[(&str, usize)]) -> LiveChart {
    let mut chart = LiveChart::from_config(config).unwrap();
    for (name, y_axis) in channels {
        chart.add_channel(name, None, *y_axis).unwrap();
    }
    chart
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builder() {
        let registry = RegistryBuilder::new()
            .channel("a")
            .channel("b")
            .samples(10)
            .build();

        assert_eq!(registry.channel_count(), 2);
        assert_eq!(registry.points_count(), 10);
        let set = registry.lock();
        assert_eq!(set.by_name("b").unwrap().buffer().get(9).unwrap(), 18.0);
    }
}

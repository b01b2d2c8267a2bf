//! Mock construction helpers

use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use streamplot_rs::{PlotPoint, RenderSink, Rgba, SeriesRegistry};

/// Create a bounded test channel
pub fn create_test_channel<T>() -> (Sender<T>, Receiver<T>) {
    bounded(16)
}

/// Render sink that keeps the last line drawn per channel
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub lines: HashMap<String, (Rgba, usize, Vec<PlotPoint>)>,
    pub clears: usize,
    pub draws: usize,
}

impl RenderSink for RecordingSink {
    fn clear(&mut self, channel: &str) {
        self.clears += 1;
        self.lines.remove(channel);
    }

    fn draw_line(&mut self, channel: &str, color: Rgba, y_axis: usize, points: &[PlotPoint]) {
        self.draws += 1;
        self.lines
            .insert(channel.to_string(), (color, y_axis, points.to_vec()));
    }
}

/// Append `frames` frames of `channels` values on a background thread
///
/// Frame `i` holds `i as f64` in every channel. Progress (frames appended so
/// far) is reported on `progress` every `report_every` frames.
pub fn spawn_frame_producer(
    registry: Arc<SeriesRegistry>,
    channels: usize,
    frames: usize,
    report_every: usize,
    progress: Sender<usize>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for i in 0..frames {
            let frame = vec![i as f64; channels];
            registry.append_frame(&frame).unwrap();
            if (i + 1) % report_every == 0 {
                let _ = progress.send(i + 1);
            }
        }
    })
}

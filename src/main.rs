//! streamplot-rs - Headless demo
//!
//! Runs the engine without a GUI: a producer thread appends generated samples
//! while the main thread ticks the chart at the configured refresh rate,
//! exercises the zoom operations and logs what would be drawn.
//!
//! Usage: `streamplot-rs [config.json]`. Without an argument the config is read
//! from the platform config directory, falling back to defaults.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use streamplot_rs::{
    config::{default_config_path, DemoConfig, LoggingConfig},
    AxisRange, ChartConfig, LiveChart, PlotPoint, RenderSink, Rgba, SeriesRegistry,
    SignalGenerator,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,streamplot_rs=debug";

fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let _log_guard = init_logging(&config.logging)?;

    tracing::info!("Starting streamplot demo");

    let mut chart = LiveChart::from_config(&config).context("Failed to create chart")?;
    for channel in &config.demo.channels {
        chart
            .add_channel(&channel.name, channel.color, channel.y_axis)
            .with_context(|| format!("Failed to register channel '{}'", channel.name))?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let producer = spawn_producer(
        Arc::clone(chart.registry()),
        &config.demo,
        Arc::clone(&running),
    );

    let result = render_loop(&mut chart, &config, &producer);

    // Signal producer to stop and wait for it
    tracing::info!("Shutting down...");
    running.store(false, Ordering::Relaxed);
    match producer.join() {
        Ok(samples) => tracing::info!("Producer appended {} samples per channel", samples),
        Err(_) => tracing::error!("Producer thread panicked"),
    }

    result
}

/// Config from the first argument, else the default location, else defaults
fn load_config() -> anyhow::Result<ChartConfig> {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => ChartConfig::load(&path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => Ok(default_config_path()
            .map(ChartConfig::load_or_default)
            .unwrap_or_default()),
    }
}

/// Console logging, plus a daily-rolling file when a log directory is set
///
/// The returned guard must be kept alive to flush the file writer.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let default_filter = config.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {:?}", dir))?;
            let appender = tracing_appender::rolling::daily(dir, "streamplot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            registry.init();
            Ok(None)
        }
    }
}

/// Append generated batches in real time until the demo duration elapses
///
/// Returns the number of samples appended per channel.
fn spawn_producer(
    registry: Arc<SeriesRegistry>,
    demo: &DemoConfig,
    running: Arc<AtomicBool>,
) -> JoinHandle<usize> {
    let period = registry.base_period();
    let batch = demo.samples_per_batch.max(1);
    let total = (demo.duration_secs / period).ceil() as usize;
    let mut generators: Vec<SignalGenerator> = demo
        .channels
        .iter()
        .enumerate()
        .map(|(i, c)| {
            SignalGenerator::new(c.pattern)
                .with_noise(c.noise)
                .with_seed(i as u64)
        })
        .collect();

    std::thread::spawn(move || {
        let mut columns = vec![vec![0.0; batch]; generators.len()];
        let mut produced = 0;
        let started = Instant::now();

        while running.load(Ordering::Relaxed) && produced < total {
            let len = batch.min(total - produced);
            for (generator, column) in generators.iter_mut().zip(columns.iter_mut()) {
                column.resize(len, 0.0);
                generator.fill(column, produced, period);
            }

            let refs: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
            if let Err(e) = registry.lock().append_columns(&refs) {
                tracing::error!("Producer stopped: {}", e);
                break;
            }
            produced += len;

            let due = Duration::from_secs_f64(produced as f64 * period);
            if let Some(wait) = due.checked_sub(started.elapsed()) {
                std::thread::sleep(wait);
            }
        }

        tracing::debug!("Producer finished after {:?}", started.elapsed());
        produced
    })
}

/// Render sink that only counts what would be drawn
#[derive(Default)]
struct SummarySink {
    lines: usize,
    points: usize,
}

impl RenderSink for SummarySink {
    fn clear(&mut self, _channel: &str) {}

    fn draw_line(&mut self, channel: &str, _color: Rgba, y_axis: usize, points: &[PlotPoint]) {
        tracing::trace!("{}: {} points on Y{}", channel, points.len(), y_axis);
        self.lines += 1;
        self.points += points.len();
    }
}

/// Scripted interaction at fixed fractions of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DemoStep {
    ZoomIn,
    AutoSet,
    Stack,
    ZoomOut,
    Reset,
}

impl DemoStep {
    fn at(tick: usize, total: usize) -> Option<Self> {
        let step = |num: usize, den: usize| tick == total * num / den;
        if step(1, 4) {
            Some(DemoStep::ZoomIn)
        } else if step(1, 2) {
            Some(DemoStep::AutoSet)
        } else if step(5, 8) {
            Some(DemoStep::Stack)
        } else if step(3, 4) {
            Some(DemoStep::ZoomOut)
        } else if step(7, 8) {
            Some(DemoStep::Reset)
        } else {
            None
        }
    }

    fn apply(self, chart: &mut LiveChart) {
        match self {
            DemoStep::ZoomIn => {
                let Some(x) = chart.axes().primary_x().map(|x| x.visual) else {
                    return;
                };
                let quarter = x.span() / 4.0;
                chart.zoom_to(Some(AxisRange::new(x.min + quarter, x.max - quarter)), None);
            }
            DemoStep::AutoSet => {
                chart.auto_set();
            }
            DemoStep::Stack => {
                chart.stack();
            }
            DemoStep::ZoomOut => {
                chart.zoom_out();
            }
            DemoStep::Reset => {
                chart.zoom_reset();
            }
        }
        tracing::info!("{:?} -> depth {}", self, chart.zoom_depth());
    }
}

fn render_loop(
    chart: &mut LiveChart,
    config: &ChartConfig,
    producer: &JoinHandle<usize>,
) -> anyhow::Result<()> {
    let refresh_hz = config.view.refresh_hz.max(1);
    let interval = Duration::from_secs_f64(1.0 / refresh_hz as f64);
    let total_ticks = (config.demo.duration_secs * refresh_hz as f64).ceil() as usize;
    let mut sink = SummarySink::default();
    let mut tick = 0;

    while !producer.is_finished() {
        let started = Instant::now();

        if let Some(step) = DemoStep::at(tick, total_ticks) {
            step.apply(chart);
        }

        if let Some(frame) = chart.tick() {
            tracing::debug!(
                "Tick {}: {} mode, {} samples, stride {:.2}",
                tick,
                frame.mode,
                frame.points_count,
                frame.plan.stride
            );
            chart.render_into(&mut sink);
        }

        for event in chart.drain_events() {
            tracing::debug!("Zoom event: {:?}", event);
        }

        tick += 1;
        if let Some(wait) = interval.checked_sub(started.elapsed()) {
            std::thread::sleep(wait);
        }
    }

    // Final frame over everything that was produced
    chart.zoom_reset();
    chart.set_follow_latest(false);
    if let Some(x) = chart.axes_mut().primary_x_mut() {
        x.visual = x.whole;
    }
    chart.tick();
    for (name, stats) in chart.visible_statistics() {
        tracing::info!(
            "{}: min {:.3}, max {:.3}, mean {:.3}, rms {:.3} ({} points)",
            name,
            stats.min,
            stats.max,
            stats.mean,
            stats.rms,
            stats.count
        );
    }

    tracing::info!(
        "Rendered {} ticks, {} lines, {} points",
        tick,
        sink.lines,
        sink.points
    );
    Ok(())
}

//! Synthetic acquisition source
//!
//! Generates sample streams for the headless demo and for tests, so the
//! engine can be exercised without a real data source.
//!
//! # Patterns
//!
//! - [`SignalPattern::Constant`] - fixed value
//! - [`SignalPattern::Sine`] - sinusoid with frequency, amplitude and offset
//! - [`SignalPattern::Counter`] - incrementing counter with wrap-around
//! - [`SignalPattern::Sawtooth`] - linear ramp that resets every period
//! - [`SignalPattern::Square`] - alternates between `+amplitude` and `-amplitude`
//! - [`SignalPattern::Triangle`] - symmetric ramp up and down
//!
//! Any pattern can carry uniform noise. The noise source is seeded, so two
//! generators built from the same configuration produce the same stream.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Shape of a generated signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalPattern {
    Constant { value: f64 },
    Sine { frequency: f64, amplitude: f64, offset: f64 },
    Counter { step: f64, min: f64, max: f64 },
    Sawtooth { period: f64, amplitude: f64 },
    Square { period: f64, amplitude: f64 },
    Triangle { period: f64, amplitude: f64 },
}

impl Default for SignalPattern {
    fn default() -> Self {
        SignalPattern::Sine {
            frequency: 1.0,
            amplitude: 100.0,
            offset: 0.0,
        }
    }
}

/// Stateful generator for one channel
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    pattern: SignalPattern,
    noise_amplitude: f64,
    counter_value: f64,
    rng: StdRng,
}

impl SignalGenerator {
    pub fn new(pattern: SignalPattern) -> Self {
        let counter_value = match pattern {
            SignalPattern::Counter { min, .. } => min,
            _ => 0.0,
        };
        Self {
            pattern,
            noise_amplitude: 0.0,
            counter_value,
            rng: StdRng::seed_from_u64(12345),
        }
    }

    /// Add uniform noise in `[-amplitude, amplitude]`
    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude.abs();
        self
    }

    /// Reseed the noise source
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn pattern(&self) -> SignalPattern {
        self.pattern
    }

    /// Value at time `t` (seconds)
    pub fn sample(&mut self, t: f64) -> f64 {
        let base = match self.pattern {
            SignalPattern::Constant { value } => value,
            SignalPattern::Sine {
                frequency,
                amplitude,
                offset,
            } => offset + amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin(),
            SignalPattern::Counter { step, min, max } => {
                let value = self.counter_value;
                self.counter_value += step;
                if self.counter_value > max {
                    self.counter_value = min;
                } else if self.counter_value < min {
                    self.counter_value = max;
                }
                value
            }
            SignalPattern::Sawtooth { period, amplitude } => {
                let phase = t.rem_euclid(period);
                amplitude * (phase / period)
            }
            SignalPattern::Square { period, amplitude } => {
                if t.rem_euclid(period) < period / 2.0 {
                    amplitude
                } else {
                    -amplitude
                }
            }
            SignalPattern::Triangle { period, amplitude } => {
                let phase = t.rem_euclid(period);
                let half = period / 2.0;
                if phase < half {
                    amplitude * (2.0 * phase / half - 1.0)
                } else {
                    amplitude * (1.0 - 2.0 * (phase - half) / half)
                }
            }
        };

        if self.noise_amplitude > 0.0 {
            base + self.rng.gen_range(-self.noise_amplitude..=self.noise_amplitude)
        } else {
            base
        }
    }

    /// Fill `out` with consecutive samples starting at sample `first_index`
    pub fn fill(&mut self, out: &mut [f64], first_index: usize, base_period: f64) {
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.sample((first_index + i) as f64 * base_period);
        }
    }
}

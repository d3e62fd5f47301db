//! Bounded stochastic metrics
//!
//! A [`SimulatedMetric`] is a random walk clamped to fixed bounds. Each
//! step computes
//!
//! ```text
//! delta  = (random() - bias) * drift_rate
//! value' = clamp(value + delta, min, max)
//! ```
//!
//! A bias above `0.5` makes the walk trend downward (soil drying out),
//! below `0.5` upward (a bin filling up).

use crate::error::{CitySimError, Result};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default drift symmetry
pub const DEFAULT_BIAS: f64 = 0.5;

/// How often a metric is recomputed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cadence {
    /// Wall-clock period between recomputations
    Every(Duration),
    /// Once per rendered frame
    EveryFrame,
}

impl Cadence {
    /// Timer cadence in milliseconds
    pub fn every_ms(ms: u64) -> Self {
        Self::Every(Duration::from_millis(ms))
    }

    /// Timer period, if any
    pub fn period(&self) -> Option<Duration> {
        match self {
            Self::Every(period) => Some(*period),
            Self::EveryFrame => None,
        }
    }
}

/// Shape of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriftKind {
    /// `(random() - bias) * drift_rate`
    #[default]
    Continuous,
    /// Exactly `+drift_rate` when `random() >= bias`, else `-drift_rate`
    Discrete,
}

/// Parameters of a simulated metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Starting reading
    pub initial: f64,
    /// Maximum magnitude of a single step
    pub drift_rate: f64,
    /// Drift symmetry, within `[0, 1]`
    #[serde(default = "default_bias")]
    pub bias: f64,
    /// Probability that a tick changes the value at all
    #[serde(default = "default_jump_probability")]
    pub jump_probability: f64,
    /// Step shape
    #[serde(default)]
    pub kind: DriftKind,
}

fn default_bias() -> f64 {
    DEFAULT_BIAS
}

fn default_jump_probability() -> f64 {
    1.0
}

impl MetricConfig {
    /// Symmetric continuous walk
    pub fn new(min: f64, max: f64, initial: f64, drift_rate: f64) -> Self {
        Self {
            min,
            max,
            initial,
            drift_rate,
            bias: DEFAULT_BIAS,
            jump_probability: 1.0,
            kind: DriftKind::Continuous,
        }
    }

    /// Set drift symmetry
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Gate each step behind a probability
    pub fn with_jump_probability(mut self, probability: f64) -> Self {
        self.jump_probability = probability;
        self
    }

    /// Use `±drift_rate` steps
    pub fn discrete(mut self) -> Self {
        self.kind = DriftKind::Discrete;
        self
    }

    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(CitySimError::InvalidBounds {
                min: self.min,
                max: self.max,
            });
        }
        if !self.initial.is_finite() || self.initial < self.min || self.initial > self.max {
            return Err(CitySimError::ValueOutOfBounds {
                value: self.initial,
                min: self.min,
                max: self.max,
            });
        }
        if !self.drift_rate.is_finite() || self.drift_rate < 0.0 {
            return Err(CitySimError::parameter(
                "drift_rate",
                format!("{} must be finite and non-negative", self.drift_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.bias) {
            return Err(CitySimError::parameter(
                "bias",
                format!("{} must be within [0, 1]", self.bias),
            ));
        }
        if !(0.0..=1.0).contains(&self.jump_probability) {
            return Err(CitySimError::parameter(
                "jump_probability",
                format!("{} must be within [0, 1]", self.jump_probability),
            ));
        }
        Ok(())
    }
}

/// A bounded numeric reading simulating a sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedMetric {
    value: f64,
    config: MetricConfig,
    steps: u64,
}

impl SimulatedMetric {
    /// Create a metric from validated parameters
    pub fn new(config: MetricConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            value: config.initial,
            config,
            steps: 0,
        })
    }

    /// Current reading
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Lower bound
    pub fn min(&self) -> f64 {
        self.config.min
    }

    /// Upper bound
    pub fn max(&self) -> f64 {
        self.config.max
    }

    /// Parameters the metric was built with
    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    /// Number of steps taken (gated-out ticks included)
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance the walk by one tick and return the new value.
    ///
    /// Consumes one draw for the gate when `jump_probability < 1`, and one
    /// draw for the step itself when the gate passes.
    pub fn step<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> f64 {
        self.steps += 1;

        if self.config.jump_probability < 1.0 && rng.next_unit() >= self.config.jump_probability
        {
            return self.value;
        }

        let draw = rng.next_unit();
        let delta = match self.config.kind {
            DriftKind::Continuous => (draw - self.config.bias) * self.config.drift_rate,
            DriftKind::Discrete => {
                if draw >= self.config.bias {
                    self.config.drift_rate
                } else {
                    -self.config.drift_rate
                }
            }
        };

        // A non-finite draw leaves the reading where it is
        if delta.is_finite() {
            self.value = self.clamp(self.value + delta);
        }
        self.value
    }

    /// Apply an external adjustment, clamped to the bounds
    pub fn nudge(&mut self, delta: f64) -> f64 {
        if delta.is_finite() {
            self.value = self.clamp(self.value + delta);
        }
        self.value
    }

    /// Overwrite the reading, clamped to the bounds
    pub fn set(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            self.value = self.clamp(value);
        }
        self.value
    }

    /// Position of the value within its bounds, in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        let range = self.config.max - self.config.min;
        if range <= 0.0 {
            return 0.0;
        }
        (self.value - self.config.min) / range
    }

    fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.config.min, self.config.max)
    }
}

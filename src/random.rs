//! Injectable random sources
//!
//! Metrics never reach for an ambient generator. Every step draws from a
//! [`RandomSource`] supplied by the caller, so a seeded generator or a
//! scripted sequence makes a trajectory reproducible.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    /// Next draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Create a seeded generator for reproducible runs.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Replays a fixed sequence of draws, cycling when exhausted.
///
/// Draws are clamped into `[0, 1)` when the source is built; a NaN draw
/// becomes `0.5`.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    position: usize,
}

impl ScriptedSource {
    /// Create a source from a non-empty draw sequence.
    ///
    /// An empty sequence replays `0.5` forever.
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        let mut draws: Vec<f64> = draws
            .into_iter()
            .map(|d| {
                if d.is_nan() {
                    0.5
                } else {
                    d.clamp(0.0, 1.0 - f64::EPSILON)
                }
            })
            .collect();
        if draws.is_empty() {
            draws.push(0.5);
        }
        Self { draws, position: 0 }
    }

    /// A source that always returns the same draw.
    pub fn constant(draw: f64) -> Self {
        Self::new([draw])
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.position
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        let draw = self.draws[self.position % self.draws.len()];
        self.position += 1;
        draw
    }
}

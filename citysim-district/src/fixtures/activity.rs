// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Building activity counters: students, patients, events, throughput.

use crate::config::ActivityConfig;
use crate::error::Result;
use crate::fixture::Fixture;
use citysim::{Cadence, DisplayStore, Publisher, RandomSource, SimulatedMetric, Tick};
use rand::rngs::StdRng;

struct Counter {
    key: String,
    metric: SimulatedMetric,
    out: Publisher<f64>,
}

/// Counters updated once per frame.
pub struct Activity<R = StdRng> {
    counters: Vec<Counter>,
    rng: R,
}

impl<R: RandomSource> Activity<R> {
    /// Build from validated configuration
    pub fn new(config: ActivityConfig, store: &DisplayStore, rng: R) -> Result<Self> {
        config.validate()?;
        let counters = config
            .counters
            .into_iter()
            .map(|counter| -> Result<Counter> {
                Ok(Counter {
                    metric: SimulatedMetric::new(counter.metric)?,
                    out: store.publisher(counter.key.as_str()),
                    key: counter.key,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { counters, rng })
    }

    /// Current value of one counter
    pub fn value(&self, key: &str) -> Option<f64> {
        self.counters
            .iter()
            .find(|counter| counter.key == key)
            .map(|counter| counter.metric.value())
    }

    /// Counter keys, in configuration order
    pub fn keys(&self) -> Vec<&str> {
        self.counters.iter().map(|c| c.key.as_str()).collect()
    }

    /// Advance every counter by one frame
    pub fn step(&mut self) {
        for counter in &mut self.counters {
            counter.metric.step(&mut self.rng);
        }
        self.publish_readings();
    }

    fn publish_readings(&self) {
        for counter in &self.counters {
            counter.out.publish(counter.metric.value());
        }
    }
}

impl<R: RandomSource + 'static> Fixture for Activity<R> {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn cadence(&self) -> Cadence {
        Cadence::EveryFrame
    }

    fn publish(&self) {
        self.publish_readings();
    }

    fn tick(&mut self, _tick: &Tick) {
        self.step();
    }
}

// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Water treatment plant
//!
//! Inflow demand wanders; when it rises above the trigger the plant runs
//! one fixed-length processing cycle, filtering a set volume per tick.
//! Filter efficiency is re-measured at the end of every cycle.

use crate::config::WaterPlantConfig;
use crate::error::Result;
use crate::fixture::Fixture;
use crate::keys;
use citysim::{
    Cadence, DisplayStore, Publisher, RandomSource, SimulatedMetric, ThresholdActuator, Tick,
    Transition,
};
use log::{debug, info};
use rand::rngs::StdRng;
use std::time::Duration;

struct PlantPublishers {
    processing: Publisher<bool>,
    process_time: Publisher<f64>,
    water_quality: Publisher<f64>,
    filtered_water: Publisher<f64>,
    efficiency: Publisher<f64>,
    cycles: Publisher<f64>,
}

/// Treatment plant with demand-triggered processing.
pub struct WaterPlant<R = StdRng> {
    config: WaterPlantConfig,
    demand: SimulatedMetric,
    water_quality: SimulatedMetric,
    efficiency: SimulatedMetric,
    processing: ThresholdActuator,
    filtered_water: f64,
    cycles: u64,
    now: Duration,
    rng: R,
    out: PlantPublishers,
}

impl<R: RandomSource> WaterPlant<R> {
    /// Build from validated configuration
    pub fn new(config: WaterPlantConfig, store: &DisplayStore, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            demand: SimulatedMetric::new(config.demand.clone())?,
            water_quality: SimulatedMetric::new(config.water_quality.clone())?,
            efficiency: SimulatedMetric::new(config.efficiency.clone())?,
            processing: ThresholdActuator::new(config.processing())?,
            config,
            filtered_water: 0.0,
            cycles: 0,
            now: Duration::ZERO,
            rng,
            out: PlantPublishers {
                processing: store.publisher(keys::WATER_PLANT_PROCESSING),
                process_time: store.publisher(keys::WATER_PLANT_PROCESS_TIME),
                water_quality: store.publisher(keys::WATER_PLANT_QUALITY),
                filtered_water: store.publisher(keys::WATER_PLANT_FILTERED),
                efficiency: store.publisher(keys::WATER_PLANT_EFFICIENCY),
                cycles: store.publisher(keys::WATER_PLANT_CYCLES),
            },
        })
    }

    /// Whether a processing cycle is running
    pub fn is_processing(&self) -> bool {
        self.processing.is_active()
    }

    /// Seconds into the current cycle, zero when idle
    pub fn process_time(&self) -> f64 {
        self.processing
            .elapsed(self.now)
            .map_or(0.0, |elapsed| elapsed.as_secs_f64())
    }

    /// Seconds left in the current cycle, zero when idle
    pub fn time_remaining(&self) -> f64 {
        self.processing
            .time_remaining(self.now)
            .map_or(0.0, |remaining| remaining.as_secs_f64())
    }

    /// Inflow demand in %
    pub fn demand(&self) -> f64 {
        self.demand.value()
    }

    /// Output water quality in %
    pub fn water_quality(&self) -> f64 {
        self.water_quality.value()
    }

    /// Filter efficiency in %
    pub fn efficiency(&self) -> f64 {
        self.efficiency.value()
    }

    /// Total filtered water in litres
    pub fn filtered_water(&self) -> f64 {
        self.filtered_water
    }

    /// Completed processing cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Advance demand, quality and processing by one tick
    pub fn step(&mut self, now: Duration) -> Transition {
        self.now = now;
        self.demand.step(&mut self.rng);
        self.water_quality.step(&mut self.rng);

        let transition = self.processing.evaluate(&self.demand, now);
        match transition {
            Transition::Activated => {
                debug!("water plant cycle started (demand {:.1}%)", self.demand.value())
            }
            Transition::Deactivated(_) => {
                self.cycles += 1;
                self.efficiency.step(&mut self.rng);
                info!(
                    "water plant cycle {} complete ({:.0} L filtered, efficiency {:.1}%)",
                    self.cycles,
                    self.filtered_water,
                    self.efficiency.value()
                );
            }
            Transition::None => {}
        }

        if self.processing.is_active() {
            self.filtered_water += self.config.filtered_per_tick;
        }

        self.publish_readings();
        transition
    }

    fn publish_readings(&self) {
        self.out.processing.publish(self.is_processing());
        self.out.process_time.publish(self.process_time());
        self.out.water_quality.publish(self.water_quality.value());
        self.out.filtered_water.publish(self.filtered_water);
        self.out.efficiency.publish(self.efficiency.value());
        self.out.cycles.publish(self.cycles as f64);
    }
}

impl<R: RandomSource + 'static> Fixture for WaterPlant<R> {
    fn name(&self) -> &'static str {
        "water_plant"
    }

    fn cadence(&self) -> Cadence {
        Cadence::every_ms(self.config.interval_ms)
    }

    fn publish(&self) {
        self.publish_readings();
    }

    fn tick(&mut self, tick: &Tick) {
        self.step(tick.now);
    }
}

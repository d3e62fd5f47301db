// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Community garden
//!
//! Soil moisture dries out between waterings. When it drops below the
//! trigger and the rainwater reservoir holds enough water, auto-watering
//! starts and raises moisture every tick until it recovers, the run hits
//! its maximum length, or the reservoir runs dry.

use crate::config::GardenConfig;
use crate::error::Result;
use crate::fixture::Fixture;
use crate::keys;
use citysim::{
    Cadence, DisplayStore, Publisher, RandomSource, SimulatedMetric, ThresholdActuator, Tick,
    Transition,
};
use log::info;
use rand::rngs::StdRng;
use std::time::Duration;

struct GardenPublishers {
    soil_moisture: Publisher<f64>,
    temperature: Publisher<f64>,
    humidity: Publisher<f64>,
    water_level: Publisher<f64>,
    watering: Publisher<bool>,
}

/// Garden sensors and the auto-watering controller.
pub struct Garden<R = StdRng> {
    config: GardenConfig,
    soil_moisture: SimulatedMetric,
    temperature: SimulatedMetric,
    humidity: SimulatedMetric,
    water_level: SimulatedMetric,
    watering: ThresholdActuator,
    rng: R,
    out: GardenPublishers,
}

impl<R: RandomSource> Garden<R> {
    /// Build from validated configuration
    pub fn new(config: GardenConfig, store: &DisplayStore, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            soil_moisture: SimulatedMetric::new(config.soil_moisture.clone())?,
            temperature: SimulatedMetric::new(config.temperature.clone())?,
            humidity: SimulatedMetric::new(config.humidity.clone())?,
            water_level: SimulatedMetric::new(config.water_level.clone())?,
            watering: ThresholdActuator::new(config.watering())?,
            config,
            rng,
            out: GardenPublishers {
                soil_moisture: store.publisher(keys::GARDEN_SOIL_MOISTURE),
                temperature: store.publisher(keys::GARDEN_TEMPERATURE),
                humidity: store.publisher(keys::GARDEN_HUMIDITY),
                water_level: store.publisher(keys::GARDEN_WATER_LEVEL),
                watering: store.publisher(keys::GARDEN_WATERING),
            },
        })
    }

    /// Soil moisture in %
    pub fn soil_moisture(&self) -> f64 {
        self.soil_moisture.value()
    }

    /// Air temperature in °C
    pub fn temperature(&self) -> f64 {
        self.temperature.value()
    }

    /// Relative humidity in %
    pub fn humidity(&self) -> f64 {
        self.humidity.value()
    }

    /// Reservoir level in %
    pub fn water_level(&self) -> f64 {
        self.water_level.value()
    }

    /// Whether the sprinklers are running
    pub fn is_watering(&self) -> bool {
        self.watering.is_active()
    }

    /// Watering controller
    pub fn watering(&self) -> &ThresholdActuator {
        &self.watering
    }

    /// Parameters the garden was built with
    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    /// Advance sensors and watering by one tick
    pub fn step(&mut self, now: Duration) -> Transition {
        self.soil_moisture.step(&mut self.rng);
        self.temperature.step(&mut self.rng);
        self.humidity.step(&mut self.rng);

        let reservoir = self.water_level.value();
        let transition =
            if self.watering.is_active() && reservoir <= self.config.interlock_stop_level {
                self.watering.interrupt(now)
            } else {
                let permitted = reservoir > self.config.interlock_start_level;
                self.watering
                    .evaluate_permitted(&self.soil_moisture, now, permitted)
            };

        match transition {
            Transition::Activated => info!(
                "garden watering started (moisture {:.1}%, reservoir {:.1}%)",
                self.soil_moisture.value(),
                reservoir
            ),
            Transition::Deactivated(reason) => info!(
                "garden watering stopped: {:?} (moisture {:.1}%)",
                reason,
                self.soil_moisture.value()
            ),
            Transition::None => {}
        }

        if self.watering.is_active() {
            self.watering.apply_effect(&mut self.soil_moisture);
            self.water_level.nudge(-self.config.water_draw);
        } else {
            self.water_level.nudge(self.config.water_refill);
        }

        self.publish_readings();
        transition
    }

    fn publish_readings(&self) {
        self.out.soil_moisture.publish(self.soil_moisture.value());
        self.out.temperature.publish(self.temperature.value());
        self.out.humidity.publish(self.humidity.value());
        self.out.water_level.publish(self.water_level.value());
        self.out.watering.publish(self.watering.is_active());
    }
}

impl<R: RandomSource + 'static> Fixture for Garden<R> {
    fn name(&self) -> &'static str {
        "garden"
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use citysim::{DeactivationReason, MetricConfig, ScriptedSource};

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    /// Draws equal to the moisture bias keep moisture flat
    fn garden(moisture: f64, reservoir: f64) -> (Garden<ScriptedSource>, DisplayStore) {
        let store = DisplayStore::new();
        let mut config = GardenConfig::default();
        config.soil_moisture = MetricConfig::new(20.0, 95.0, moisture, 1.0).with_bias(0.8);
        config.water_level = MetricConfig::new(0.0, 100.0, reservoir, 0.0);
        let garden = Garden::new(config, &store, ScriptedSource::constant(0.8)).unwrap();
        (garden, store)
    }

    #[test]
    fn test_dry_soil_starts_watering_within_one_tick() {
        let (mut garden, store) = garden(35.0, 80.0);

        assert_eq!(garden.step(secs(2)), Transition::Activated);
        assert!(garden.is_watering());
        assert_relative_eq!(garden.soil_moisture(), 37.0);
        assert_relative_eq!(garden.water_level(), 79.2, epsilon = 1e-9);
        assert_eq!(store.flag(keys::GARDEN_WATERING), Some(true));
    }

    #[test]
    fn test_watering_stops_at_recovery() {
        let (mut garden, _store) = garden(35.0, 80.0);

        let mut stopped = None;
        for tick in 1..=20 {
            if let Transition::Deactivated(reason) = garden.step(secs(2 * tick)) {
                stopped = Some((tick, reason));
                break;
            }
        }

        // 35 + 2 per tick reaches 61 after 13 active ticks
        assert_eq!(stopped, Some((14, DeactivationReason::Recovered)));
        assert_relative_eq!(garden.soil_moisture(), 61.0);
        assert_relative_eq!(garden.water_level(), 80.0 - 13.0 * 0.8 + 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_moisture_rises_by_bounded_increment() {
        let (mut garden, _store) = garden(30.0, 80.0);
        let mut previous = garden.soil_moisture();
        for tick in 1..=5 {
            garden.step(secs(2 * tick));
            let current = garden.soil_moisture();
            assert!(current - previous <= 2.0 + 1e-9);
            previous = current;
        }
    }

    #[test]
    fn test_low_reservoir_blocks_watering() {
        let (mut garden, _store) = garden(30.0, 10.0);
        assert_eq!(garden.step(secs(2)), Transition::None);
        assert!(!garden.is_watering());
        assert_relative_eq!(garden.water_level(), 10.1, epsilon = 1e-9);
    }

    #[test]
    fn test_exhausted_reservoir_interrupts_watering() {
        let (mut garden, store) = garden(20.0, 12.0);

        let mut interrupted_at = None;
        for tick in 1..=15 {
            let transition = garden.step(secs(2 * tick));
            if transition == Transition::Deactivated(DeactivationReason::Interrupted) {
                interrupted_at = Some(tick);
            }
        }

        // 12 - 9 * 0.8 = 4.8 after the ninth draw
        assert_eq!(interrupted_at, Some(10));
        assert!(!garden.is_watering());
        assert!(garden.water_level() < garden.config().interlock_start_level);
        assert_eq!(store.flag(keys::GARDEN_WATERING), Some(false));
    }

    #[test]
    fn test_readings_stay_in_bounds() {
        let store = DisplayStore::new();
        let mut garden =
            Garden::new(GardenConfig::default(), &store, citysim::random::seeded(7)).unwrap();

        for tick in 1..=2000 {
            garden.step(secs(2 * tick));
            assert!((20.0..=95.0).contains(&garden.soil_moisture()));
            assert!((18.0..=32.0).contains(&garden.temperature()));
            assert!((30.0..=80.0).contains(&garden.humidity()));
            assert!((0.0..=100.0).contains(&garden.water_level()));
        }
        assert!(garden.watering().activations() > 0);
    }

    #[test]
    fn test_publishes_on_mount() {
        let (garden, store) = garden(65.0, 80.0);
        garden.publish();
        assert_eq!(store.number(keys::GARDEN_SOIL_MOISTURE), Some(65.0));
        assert_eq!(store.number(keys::GARDEN_WATER_LEVEL), Some(80.0));
        assert_eq!(store.flag(keys::GARDEN_WATERING), Some(false));
        assert_eq!(garden.cadence(), Cadence::every_ms(2000));
    }
}

// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Waste management
//!
//! Street bins fill up over time. A bin above the alert level raises the
//! district-wide alert and is emptied by the collection truck, a fixed
//! volume per tick, until it is back near empty.

use crate::config::WasteConfig;
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

/// Status shown for the collection truck
pub const TRUCK_IDLE: &str = "idle";
/// Status shown while any bin is being emptied
pub const TRUCK_COLLECTING: &str = "collecting";

struct Bin {
    id: String,
    fill: SimulatedMetric,
    collection: ThresholdActuator,
    level: Publisher<f64>,
    collecting: Publisher<bool>,
}

/// Street bins and their collection runs.
pub struct WasteManagement<R = StdRng> {
    config: WasteConfig,
    bins: Vec<Bin>,
    collected: f64,
    rng: R,
    alert: Publisher<bool>,
    collected_out: Publisher<f64>,
    truck_status: Publisher<String>,
}

impl<R: RandomSource> WasteManagement<R> {
    /// Build from validated configuration
    pub fn new(config: WasteConfig, store: &DisplayStore, rng: R) -> Result<Self> {
        config.validate()?;
        let bins = config
            .bins
            .iter()
            .map(|bin| -> Result<Bin> {
                Ok(Bin {
                    fill: SimulatedMetric::new(bin.fill.clone())?,
                    collection: ThresholdActuator::new(config.collection())?,
                    level: store.publisher(keys::waste_bin_level(&bin.id)),
                    collecting: store.publisher(keys::waste_bin_collecting(&bin.id)),
                    id: bin.id.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            bins,
            collected: 0.0,
            rng,
            alert: store.publisher(keys::WASTE_ALERT),
            collected_out: store.publisher(keys::WASTE_COLLECTED),
            truck_status: store.publisher(keys::WASTE_TRUCK_STATUS),
        })
    }

    /// Bin identifiers, in configuration order
    pub fn bin_ids(&self) -> Vec<&str> {
        self.bins.iter().map(|bin| bin.id.as_str()).collect()
    }

    /// Fill level of one bin in %
    pub fn level(&self, id: &str) -> Option<f64> {
        self.bin(id).map(|bin| bin.fill.value())
    }

    /// Whether one bin is being emptied
    pub fn is_collecting(&self, id: &str) -> Option<bool> {
        self.bin(id).map(|bin| bin.collection.is_active())
    }

    /// Whether any bin is above the alert level and being emptied
    pub fn alert(&self) -> bool {
        self.bins.iter().any(|bin| bin.collection.is_active())
    }

    /// Truck status label
    pub fn truck_status(&self) -> &'static str {
        if self.alert() {
            TRUCK_COLLECTING
        } else {
            TRUCK_IDLE
        }
    }

    /// Total fill removed by collections, in % of one bin
    pub fn collected(&self) -> f64 {
        self.collected
    }

    /// Parameters the fixture was built with
    pub fn config(&self) -> &WasteConfig {
        &self.config
    }

    /// Advance every bin by one tick; returns the transitions that occurred
    pub fn step(&mut self, now: Duration) -> Vec<(String, Transition)> {
        let was_alert = self.alert();
        let mut transitions = Vec::new();

        for bin in &mut self.bins {
            bin.fill.step(&mut self.rng);
            let transition = bin.collection.evaluate(&bin.fill, now);
            if transition != Transition::None {
                transitions.push((bin.id.clone(), transition));
            }

            let before = bin.fill.value();
            let after = bin.collection.apply_effect(&mut bin.fill);
            self.collected += before - after;
        }

        let alert = self.alert();
        if alert != was_alert {
            if alert {
                info!("waste alert raised");
            } else {
                info!("waste alert cleared ({:.0}% collected)", self.collected);
            }
        }

        self.publish_readings();
        transitions
    }

    fn bin(&self, id: &str) -> Option<&Bin> {
        self.bins.iter().find(|bin| bin.id == id)
    }

    fn publish_readings(&self) {
        for bin in &self.bins {
            bin.level.publish(bin.fill.value());
            bin.collecting.publish(bin.collection.is_active());
        }
        self.alert.publish(self.alert());
        self.collected_out.publish(self.collected);
        self.truck_status.publish(self.truck_status().to_string());
    }
}

impl<R: RandomSource + 'static> Fixture for WasteManagement<R> {
    fn name(&self) -> &'static str {
        "waste"
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
    use crate::config::WasteBinConfig;
    use approx::assert_relative_eq;
    use citysim::{DeactivationReason, MetricConfig, ScriptedSource};

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    /// One flat bin (draws equal to the fill bias) at `level`
    fn single_bin(level: f64) -> (WasteManagement<ScriptedSource>, DisplayStore) {
        let store = DisplayStore::new();
        let config = WasteConfig {
            bins: vec![WasteBinConfig {
                id: "bin1".to_string(),
                fill: MetricConfig::new(0.0, 100.0, level, 2.0).with_bias(0.2),
            }],
            ..WasteConfig::default()
        };
        let waste = WasteManagement::new(config, &store, ScriptedSource::constant(0.2)).unwrap();
        (waste, store)
    }

    #[test]
    fn test_full_bin_is_collected() {
        let (mut waste, store) = single_bin(85.0);

        let transitions = waste.step(secs(2));
        assert_eq!(transitions, vec![("bin1".to_string(), Transition::Activated)]);
        assert_relative_eq!(waste.level("bin1").unwrap(), 60.0);
        assert!(waste.alert());
        assert_eq!(store.flag(keys::WASTE_ALERT), Some(true));
        assert_eq!(
            store.text(keys::WASTE_TRUCK_STATUS).as_deref(),
            Some(TRUCK_COLLECTING)
        );

        // 60 -> 35 -> 10 -> 0, then recovered on the next evaluation
        for t in [4, 6, 8] {
            assert!(waste.step(secs(t)).is_empty());
        }
        assert_relative_eq!(waste.level("bin1").unwrap(), 0.0);

        let transitions = waste.step(secs(10));
        assert_eq!(
            transitions,
            vec![(
                "bin1".to_string(),
                Transition::Deactivated(DeactivationReason::Recovered)
            )]
        );
        assert!(!waste.alert());
        assert_relative_eq!(waste.collected(), 85.0);
        assert_eq!(store.flag(keys::WASTE_ALERT), Some(false));
        assert_eq!(store.number(keys::WASTE_COLLECTED), Some(85.0));
        assert_eq!(store.text(keys::WASTE_TRUCK_STATUS).as_deref(), Some(TRUCK_IDLE));
    }

    #[test]
    fn test_bins_below_alert_are_left_alone() {
        let (mut waste, _store) = single_bin(50.0);
        for tick in 1..=10 {
            assert!(waste.step(secs(2 * tick)).is_empty());
        }
        assert_eq!(waste.is_collecting("bin1"), Some(false));
        assert_eq!(waste.collected(), 0.0);
    }

    #[test]
    fn test_default_bins_publish_per_bin_keys() {
        let store = DisplayStore::new();
        let waste =
            WasteManagement::new(WasteConfig::default(), &store, citysim::random::seeded(3))
                .unwrap();
        waste.publish();

        assert_eq!(waste.bin_ids(), vec!["bin1", "bin2", "bin3", "bin4", "bin5", "bin6"]);
        assert_eq!(store.number("waste.bin1.level"), Some(35.0));
        assert_eq!(store.flag("waste.bin6.collecting"), Some(false));
        assert_eq!(waste.level("bin7"), None);
    }

    #[test]
    fn test_bins_fill_and_get_collected() {
        let store = DisplayStore::new();
        let mut waste =
            WasteManagement::new(WasteConfig::default(), &store, citysim::random::seeded(5))
                .unwrap();

        for tick in 1..=1000 {
            waste.step(secs(2 * tick));
            for id in ["bin1", "bin2", "bin3", "bin4", "bin5", "bin6"] {
                let level = waste.level(id).unwrap();
                assert!((0.0..=100.0).contains(&level));
            }
        }
        assert!(waste.collected() > 0.0);
    }
}

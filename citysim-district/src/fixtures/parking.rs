// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Parking occupancy
//!
//! Each lot gains or loses at most one car per frame.

use crate::config::ParkingConfig;
use crate::error::Result;
use crate::fixture::Fixture;
use crate::keys;
use citysim::{Cadence, DisplayStore, Publisher, RandomSource, SimulatedMetric, Tick};
use rand::rngs::StdRng;

struct Lot {
    id: String,
    capacity: u32,
    occupied: SimulatedMetric,
    occupied_out: Publisher<f64>,
    free_out: Publisher<f64>,
    occupancy_out: Publisher<f64>,
}

impl Lot {
    fn occupied(&self) -> u32 {
        self.occupied.value().round() as u32
    }

    fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.occupied())
    }

    fn occupancy(&self) -> f64 {
        self.occupied() as f64 / self.capacity as f64 * 100.0
    }
}

/// Parking lots updated once per frame.
pub struct Parking<R = StdRng> {
    lots: Vec<Lot>,
    rng: R,
}

impl<R: RandomSource> Parking<R> {
    /// Build from validated configuration
    pub fn new(config: ParkingConfig, store: &DisplayStore, rng: R) -> Result<Self> {
        config.validate()?;
        let lots = config
            .lots
            .iter()
            .map(|lot| -> Result<Lot> {
                Ok(Lot {
                    id: lot.id.clone(),
                    capacity: lot.capacity,
                    occupied: SimulatedMetric::new(lot.occupancy())?,
                    occupied_out: store.publisher(keys::parking_occupied(&lot.id)),
                    free_out: store.publisher(keys::parking_free(&lot.id)),
                    occupancy_out: store.publisher(keys::parking_occupancy(&lot.id)),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { lots, rng })
    }

    /// Occupied spots in one lot
    pub fn occupied(&self, id: &str) -> Option<u32> {
        self.lot(id).map(Lot::occupied)
    }

    /// Free spots in one lot
    pub fn free(&self, id: &str) -> Option<u32> {
        self.lot(id).map(Lot::free)
    }

    /// Occupancy of one lot in %
    pub fn occupancy(&self, id: &str) -> Option<f64> {
        self.lot(id).map(Lot::occupancy)
    }

    /// Advance every lot by one frame
    pub fn step(&mut self) {
        for lot in &mut self.lots {
            lot.occupied.step(&mut self.rng);
        }
        self.publish_readings();
    }

    fn lot(&self, id: &str) -> Option<&Lot> {
        self.lots.iter().find(|lot| lot.id == id)
    }

    fn publish_readings(&self) {
        for lot in &self.lots {
            lot.occupied_out.publish(lot.occupied() as f64);
            lot.free_out.publish(lot.free() as f64);
            lot.occupancy_out.publish(lot.occupancy());
        }
    }
}

impl<R: RandomSource + 'static> Fixture for Parking<R> {
    fn name(&self) -> &'static str {
        "parking"
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

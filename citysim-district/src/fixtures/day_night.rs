// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Day/night cycle and street lighting

use crate::config::{DayNightConfig, TimeOfDay};
use crate::error::Result;
use crate::fixture::Fixture;
use crate::keys;
use citysim::{Cadence, DisplayStore, Publisher, Tick};
use log::info;

/// Alternates day and night; street lights follow the night or a manual override.
pub struct DayNight {
    config: DayNightConfig,
    phase: TimeOfDay,
    forced: bool,
    phases: u64,
    time_of_day: Publisher<String>,
    street_lights: Publisher<bool>,
}

impl DayNight {
    /// Build from validated configuration
    pub fn new(config: DayNightConfig, store: &DisplayStore) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            phase: config.start,
            forced: config.street_lights_forced,
            phases: 0,
            config,
            time_of_day: store.publisher(keys::TIME_OF_DAY),
            street_lights: store.publisher(keys::STREET_LIGHTS),
        })
    }

    /// Current phase
    pub fn time_of_day(&self) -> TimeOfDay {
        self.phase
    }

    /// Whether the street lights are on
    pub fn street_lights_on(&self) -> bool {
        self.forced || self.phase == TimeOfDay::Night
    }

    /// Whether the manual override is set
    pub fn street_lights_forced(&self) -> bool {
        self.forced
    }

    /// Number of phase changes so far
    pub fn phases(&self) -> u64 {
        self.phases
    }

    /// Set or clear the manual street light override
    pub fn force_street_lights(&mut self, on: bool) {
        if self.forced != on {
            info!("street lights override {}", if on { "on" } else { "off" });
        }
        self.forced = on;
        self.publish();
    }

    /// Switch to the other phase
    pub fn advance_phase(&mut self) -> TimeOfDay {
        self.phase = self.phase.toggled();
        self.phases += 1;
        info!("{} begins", self.phase.as_str());
        self.publish();
        self.phase
    }
}

impl Fixture for DayNight {
    fn name(&self) -> &'static str {
        "day_night"
    }

    fn cadence(&self) -> Cadence {
        Cadence::every_ms(self.config.phase_ms)
    }

    fn publish(&self) {
        self.time_of_day.publish(self.phase.as_str().to_string());
        self.street_lights.publish(self.street_lights_on());
    }

    fn tick(&mut self, _tick: &Tick) {
        self.advance_phase();
    }
}

// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Composition root
//!
//! A [`District`] owns the display store and every mounted fixture. Each
//! fixture gets its own generator, seeded from the district seed, so
//! disabling one fixture never changes another's trajectory.

use crate::config::DistrictConfig;
use crate::error::Result;
use crate::fixture::{Fixture, Mounted};
use crate::fixtures::{Activity, DayNight, Garden, Parking, WasteManagement, WaterPlant};
use citysim::random::seeded;
use citysim::{DisplayStore, Scheduler, StoreSnapshot};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one fixture of the district
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureKind {
    Garden,
    WaterPlant,
    Waste,
    Parking,
    Activity,
    DayNight,
}

impl FixtureKind {
    /// Every fixture, in mount order
    pub const ALL: [FixtureKind; 6] = [
        FixtureKind::Garden,
        FixtureKind::WaterPlant,
        FixtureKind::Waste,
        FixtureKind::Parking,
        FixtureKind::Activity,
        FixtureKind::DayNight,
    ];

    /// Name used in logs and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureKind::Garden => "garden",
            FixtureKind::WaterPlant => "water_plant",
            FixtureKind::Waste => "waste",
            FixtureKind::Parking => "parking",
            FixtureKind::Activity => "activity",
            FixtureKind::DayNight => "day_night",
        }
    }

    fn stream(&self) -> u64 {
        match self {
            FixtureKind::Garden => 1,
            FixtureKind::WaterPlant => 2,
            FixtureKind::Waste => 3,
            FixtureKind::Parking => 4,
            FixtureKind::Activity => 5,
            FixtureKind::DayNight => 6,
        }
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seed for one fixture's generator
pub fn fixture_seed(seed: u64, kind: FixtureKind) -> u64 {
    seed ^ kind.stream().wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn mount_section<C, F: Fixture>(
    section: Option<&C>,
    scheduler: &dyn Scheduler,
    build: impl FnOnce(&C) -> Result<F>,
) -> Result<Option<Mounted<F>>> {
    section
        .map(|config| build(config).and_then(|fixture| Mounted::mount(fixture, scheduler)))
        .transpose()
}

/// Every fixture of the scene, wired to one store and one scheduler.
pub struct District {
    store: DisplayStore,
    seed: u64,
    garden: Option<Mounted<Garden>>,
    water_plant: Option<Mounted<WaterPlant>>,
    waste: Option<Mounted<WasteManagement>>,
    parking: Option<Mounted<Parking>>,
    activity: Option<Mounted<Activity>>,
    day_night: Option<Mounted<DayNight>>,
}

impl District {
    /// Validate the configuration and mount every enabled fixture
    pub fn mount(config: &DistrictConfig, scheduler: &dyn Scheduler, seed: u64) -> Result<Self> {
        config.validate()?;
        let store = DisplayStore::new();
        let rng = |kind| seeded(fixture_seed(seed, kind));

        let district = Self {
            garden: mount_section(config.garden.as_ref(), scheduler, |c| {
                Garden::new(c.clone(), &store, rng(FixtureKind::Garden))
            })?,
            water_plant: mount_section(config.water_plant.as_ref(), scheduler, |c| {
                WaterPlant::new(c.clone(), &store, rng(FixtureKind::WaterPlant))
            })?,
            waste: mount_section(config.waste.as_ref(), scheduler, |c| {
                WasteManagement::new(c.clone(), &store, rng(FixtureKind::Waste))
            })?,
            parking: mount_section(config.parking.as_ref(), scheduler, |c| {
                Parking::new(c.clone(), &store, rng(FixtureKind::Parking))
            })?,
            activity: mount_section(config.activity.as_ref(), scheduler, |c| {
                Activity::new(c.clone(), &store, rng(FixtureKind::Activity))
            })?,
            day_night: mount_section(config.day_night.as_ref(), scheduler, |c| {
                DayNight::new(c.clone(), &store)
            })?,
            store,
            seed,
        };

        info!(
            "district mounted with seed {} ({} fixtures, {} readings)",
            seed,
            district.mounted().len(),
            district.store.len()
        );
        Ok(district)
    }

    /// Display store the fixtures publish into
    pub fn store(&self) -> &DisplayStore {
        &self.store
    }

    /// Seed the district was mounted with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Copy of every reading
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Fixtures currently mounted, in mount order
    pub fn mounted(&self) -> Vec<FixtureKind> {
        FixtureKind::ALL
            .into_iter()
            .filter(|kind| self.is_mounted(*kind))
            .collect()
    }

    /// Whether a fixture is mounted
    pub fn is_mounted(&self, kind: FixtureKind) -> bool {
        match kind {
            FixtureKind::Garden => self.garden.as_ref().map_or(false, Mounted::is_mounted),
            FixtureKind::WaterPlant => self.water_plant.as_ref().map_or(false, Mounted::is_mounted),
            FixtureKind::Waste => self.waste.as_ref().map_or(false, Mounted::is_mounted),
            FixtureKind::Parking => self.parking.as_ref().map_or(false, Mounted::is_mounted),
            FixtureKind::Activity => self.activity.as_ref().map_or(false, Mounted::is_mounted),
            FixtureKind::DayNight => self.day_night.as_ref().map_or(false, Mounted::is_mounted),
        }
    }

    /// Unmount one fixture; its last readings stay in the store.
    ///
    /// Returns false when it was not mounted.
    pub fn unmount(&mut self, kind: FixtureKind) -> bool {
        match kind {
            FixtureKind::Garden => self.garden.take().is_some(),
            FixtureKind::WaterPlant => self.water_plant.take().is_some(),
            FixtureKind::Waste => self.waste.take().is_some(),
            FixtureKind::Parking => self.parking.take().is_some(),
            FixtureKind::Activity => self.activity.take().is_some(),
            FixtureKind::DayNight => self.day_night.take().is_some(),
        }
    }

    /// Unmount every fixture
    pub fn unmount_all(&mut self) {
        for kind in FixtureKind::ALL {
            self.unmount(kind);
        }
    }

    /// Garden, if mounted
    pub fn garden(&self) -> Option<&Mounted<Garden>> {
        self.garden.as_ref()
    }

    /// Water plant, if mounted
    pub fn water_plant(&self) -> Option<&Mounted<WaterPlant>> {
        self.water_plant.as_ref()
    }

    /// Waste management, if mounted
    pub fn waste(&self) -> Option<&Mounted<WasteManagement>> {
        self.waste.as_ref()
    }

    /// Parking, if mounted
    pub fn parking(&self) -> Option<&Mounted<Parking>> {
        self.parking.as_ref()
    }

    /// Activity counters, if mounted
    pub fn activity(&self) -> Option<&Mounted<Activity>> {
        self.activity.as_ref()
    }

    /// Day/night cycle, if mounted
    pub fn day_night(&self) -> Option<&Mounted<DayNight>> {
        self.day_night.as_ref()
    }

    /// Set or clear the street light override; false without a day/night cycle
    pub fn force_street_lights(&self, on: bool) -> bool {
        match &self.day_night {
            Some(mounted) => {
                mounted.fixture_mut().force_street_lights(on);
                true
            }
            None => false,
        }
    }
}

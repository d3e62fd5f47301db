// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # CitySim District
//!
//! The fixtures of an illustrative smart-city scene, built from the
//! `citysim` metrics and actuators:
//!
//! - **Garden**: soil sensors and auto-watering from a rainwater reservoir
//! - **Water plant**: demand-triggered processing cycles
//! - **Waste**: filling street bins and collection runs
//! - **Parking** and **activity** counters, updated per frame
//! - **Day/night**: phase cycle and street lighting
//!
//! A [`District`] mounts the fixtures enabled in a [`DistrictConfig`]
//! onto a scheduler and owns the display store they publish into.
//!
//! ## Example
//!
//! ```rust
//! use citysim::TickScheduler;
//! use citysim_district::{keys, District, DistrictConfig};
//! use std::time::Duration;
//!
//! let scheduler = TickScheduler::new();
//! let district = District::mount(&DistrictConfig::default(), &scheduler, 42).unwrap();
//!
//! scheduler.run_frames(Duration::from_millis(100), 600);
//!
//! let moisture = district.store().number(keys::GARDEN_SOIL_MOISTURE).unwrap();
//! assert!((20.0..=95.0).contains(&moisture));
//! ```

pub mod config;
pub mod district;
pub mod error;
pub mod fixture;
pub mod fixtures;
pub mod keys;

pub use config::{
    ActivityConfig, CounterConfig, DayNightConfig, DistrictConfig, GardenConfig, ParkingConfig,
    ParkingLotConfig, TimeOfDay, WasteBinConfig, WasteConfig, WaterPlantConfig,
};
pub use district::{fixture_seed, District, FixtureKind};
pub use error::{DistrictError, Result};
pub use fixture::{Fixture, Mounted};
pub use fixtures::{Activity, DayNight, Garden, Parking, WasteManagement, WaterPlant};

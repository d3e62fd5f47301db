// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! The fixtures of the scene, one module each.

pub mod activity;
pub mod day_night;
pub mod garden;
pub mod parking;
pub mod waste;
pub mod water_plant;

pub use activity::Activity;
pub use day_night::DayNight;
pub use garden::Garden;
pub use parking::Parking;
pub use waste::WasteManagement;
pub use water_plant::WaterPlant;

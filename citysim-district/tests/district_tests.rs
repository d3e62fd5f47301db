// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! District integration tests: mounting, unmounting, reproducibility
//! and configuration files.

use citysim::{MetricConfig, Scheduler, TickScheduler};
use citysim_district::{
    keys, DistrictConfig, DistrictError, District, FixtureKind, GardenConfig,
};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const FRAME: Duration = Duration::from_millis(100);

fn run(seed: u64, frames: u64) -> citysim::StoreSnapshot {
    let scheduler = TickScheduler::new();
    let district = District::mount(&DistrictConfig::default(), &scheduler, seed).unwrap();
    scheduler.run_frames(FRAME, frames);
    district.snapshot()
}

#[test]
fn test_same_seed_same_snapshot() {
    let a = run(42, 3000);
    let b = run(42, 3000);
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_different_seeds_diverge() {
    assert_ne!(run(1, 3000).readings, run(2, 3000).readings);
}

#[test]
fn test_disabling_one_fixture_keeps_others_reproducible() {
    let full = run(9, 1000);

    let scheduler = TickScheduler::new();
    let config = DistrictConfig {
        waste: None,
        ..DistrictConfig::default()
    };
    let district = District::mount(&config, &scheduler, 9).unwrap();
    scheduler.run_frames(FRAME, 1000);
    let partial = district.snapshot();

    assert_eq!(
        partial.number(keys::GARDEN_SOIL_MOISTURE),
        full.number(keys::GARDEN_SOIL_MOISTURE)
    );
    assert_eq!(partial.number(keys::WASTE_COLLECTED), None);
}

#[test]
fn test_dry_garden_waters_within_one_tick() {
    let scheduler = TickScheduler::new();
    let mut garden = GardenConfig::default();
    garden.soil_moisture = MetricConfig::new(20.0, 95.0, 35.0, 1.0).with_bias(0.8);
    let config = DistrictConfig {
        garden: Some(garden),
        ..DistrictConfig::empty()
    };
    let district = District::mount(&config, &scheduler, 3).unwrap();
    assert_eq!(district.store().flag(keys::GARDEN_WATERING), Some(false));

    // Worst-case drying is 0.8 per tick, so 35 stays below 40 and the first
    // tick always starts watering.
    scheduler.advance(Duration::from_secs(2));
    assert_eq!(district.store().flag(keys::GARDEN_WATERING), Some(true));

    let mounted = district.garden().unwrap();
    assert!(mounted.fixture().is_watering());
    assert!(mounted.fixture().soil_moisture() > 35.0 - 0.8 + 2.0 - 1e-9);
}

#[test]
fn test_watering_never_outlasts_max_duration() {
    let scheduler = TickScheduler::new();
    let config = DistrictConfig {
        garden: Some(GardenConfig::default()),
        ..DistrictConfig::empty()
    };
    let district = District::mount(&config, &scheduler, 17).unwrap();
    let garden = district.garden().unwrap();
    let max = garden.fixture().config().watering().max_active;
    let min = garden.fixture().config().watering().min_active;

    let mut started = None;
    let mut runs = 0;
    for _ in 0..5000 {
        scheduler.advance(Duration::from_secs(2));
        let now = scheduler.now();
        let watering = garden.fixture().is_watering();
        match (started, watering) {
            (None, true) => started = Some(now),
            (Some(since), true) => assert!(now - since < max),
            (Some(since), false) => {
                assert!(now - since >= min);
                runs += 1;
                started = None;
            }
            (None, false) => {}
        }
    }
    assert!(runs > 0);
}

#[test]
fn test_unmounted_fixture_stops_mutating() {
    let scheduler = TickScheduler::new();
    let mut district = District::mount(&DistrictConfig::default(), &scheduler, 5).unwrap();
    scheduler.run_frames(FRAME, 100);

    district.unmount(FixtureKind::Garden);
    let moisture = district.store().key_revision(keys::GARDEN_SOIL_MOISTURE);
    let temperature = district.store().key_revision(keys::GARDEN_TEMPERATURE);

    scheduler.run_frames(FRAME, 1000);
    assert_eq!(
        district.store().key_revision(keys::GARDEN_SOIL_MOISTURE),
        moisture
    );
    assert_eq!(
        district.store().key_revision(keys::GARDEN_TEMPERATURE),
        temperature
    );
    assert!(district.is_mounted(FixtureKind::Parking));
}

#[test]
fn test_dropping_district_cancels_everything() {
    let scheduler = TickScheduler::new();
    let district = District::mount(&DistrictConfig::default(), &scheduler, 5).unwrap();
    let store = district.store().clone();
    drop(district);

    assert_eq!(scheduler.subscription_count(), 0);
    let revision = store.revision();
    scheduler.run_frames(FRAME, 1000);
    assert_eq!(store.revision(), revision);
}

#[test]
fn test_day_night_cycle() {
    let scheduler = TickScheduler::new();
    let config = DistrictConfig {
        day_night: Some(Default::default()),
        ..DistrictConfig::empty()
    };
    let district = District::mount(&config, &scheduler, 0).unwrap();

    scheduler.advance(Duration::from_secs(60));
    assert_eq!(district.store().text(keys::TIME_OF_DAY).as_deref(), Some("night"));
    assert_eq!(district.store().flag(keys::STREET_LIGHTS), Some(true));

    scheduler.advance(Duration::from_secs(60));
    assert_eq!(district.store().text(keys::TIME_OF_DAY).as_deref(), Some("day"));
    assert_eq!(district.store().flag(keys::STREET_LIGHTS), Some(false));
}

#[test]
fn test_config_file_roundtrip() {
    let config = DistrictConfig::default();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config.to_json_pretty().unwrap().as_bytes())
        .unwrap();

    let loaded = DistrictConfig::from_path(file.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"garden": {{"interval_ms": 1000, "soil_moisture": {{"min": 20, "max": 95, "initial": 50, "drift_rate": 1}}, "temperature": {{"min": 18, "max": 32, "initial": 24, "drift_rate": 1}}, "humidity": {{"min": 30, "max": 80, "initial": 45, "drift_rate": 1}}, "water_level": {{"min": 0, "max": 100, "initial": 80, "drift_rate": 0}}, "watering_trigger": 30, "watering_recovery": 50, "watering_min_ms": 4000, "watering_max_ms": 30000, "watering_boost": 3, "water_draw": 1, "water_refill": 0.2, "interlock_start_level": 10, "interlock_stop_level": 5}}, "waste": null}}"#
    )
    .unwrap();

    let config = DistrictConfig::from_path(file.path()).unwrap();
    let garden = config.garden.as_ref().unwrap();
    assert_eq!(garden.watering_trigger, 30.0);
    assert_eq!(garden.soil_moisture.bias, 0.5);
    assert!(config.waste.is_none());
    assert!(config.parking.is_some());

    let scheduler = TickScheduler::new();
    let district = District::mount(&config, &scheduler, 1).unwrap();
    assert!(!district.is_mounted(FixtureKind::Waste));
    assert_eq!(district.store().number(keys::GARDEN_SOIL_MOISTURE), Some(50.0));
}

#[test]
fn test_invalid_config_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"day_night": {{"phase_ms": 0, "start": "day", "street_lights_forced": false}}}}"#)
        .unwrap();
    assert!(matches!(
        DistrictConfig::from_path(file.path()),
        Err(DistrictError::InvalidConfig(_))
    ));

    let mut config = DistrictConfig::default();
    config.water_plant.as_mut().unwrap().demand.initial = 150.0;
    let scheduler = TickScheduler::new();
    assert!(matches!(
        District::mount(&config, &scheduler, 1),
        Err(DistrictError::Sim(_))
    ));
    assert_eq!(scheduler.subscription_count(), 0);

    assert!(matches!(
        DistrictConfig::from_path("/nonexistent/district.json"),
        Err(DistrictError::Io(_))
    ));
}

// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for CitySim District
//!
//! Every threshold a fixture reacts to is a named field with a documented
//! default. A whole district can be loaded from, or written to, JSON.

use crate::error::{DistrictError, Result};
use crate::keys;
use citysim::{ActuatorConfig, MetricConfig};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

fn non_zero_ms(name: &str, ms: u64) -> Result<()> {
    if ms == 0 {
        return Err(DistrictError::InvalidConfig(format!(
            "{} must be non-zero",
            name
        )));
    }
    Ok(())
}

fn unique_ids<'a>(section: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() {
            return Err(DistrictError::InvalidConfig(format!(
                "{}: empty identifier",
                section
            )));
        }
        if !seen.insert(id) {
            return Err(DistrictError::InvalidConfig(format!(
                "{}: duplicate identifier {}",
                section, id
            )));
        }
    }
    Ok(())
}

/// Community garden: soil sensors and auto-watering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GardenConfig {
    /// Sensor refresh period (default: 2000)
    pub interval_ms: u64,
    /// Soil moisture in % (default: 20..95 from 65, drying bias 0.8)
    pub soil_moisture: MetricConfig,
    /// Air temperature in °C (default: 18..32 from 24)
    pub temperature: MetricConfig,
    /// Relative humidity in % (default: 30..80 from 45, bias 0.4)
    pub humidity: MetricConfig,
    /// Rainwater reservoir in % (default: 0..100 from 80, no drift)
    pub water_level: MetricConfig,
    /// Moisture below which watering starts (default: 40)
    pub watering_trigger: f64,
    /// Moisture at which watering completes (default: 60)
    pub watering_recovery: f64,
    /// Shortest watering run (default: 6000)
    pub watering_min_ms: u64,
    /// Longest watering run (default: 60000)
    pub watering_max_ms: u64,
    /// Moisture added per tick while watering (default: 2)
    pub watering_boost: f64,
    /// Reservoir drawn per tick while watering (default: 0.8)
    pub water_draw: f64,
    /// Reservoir refilled per idle tick (default: 0.1)
    pub water_refill: f64,
    /// Reservoir level required to start watering (default: 10)
    pub interlock_start_level: f64,
    /// Reservoir level at or below which watering is cut (default: 5)
    pub interlock_stop_level: f64,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            soil_moisture: MetricConfig::new(20.0, 95.0, 65.0, 1.0).with_bias(0.8),
            temperature: MetricConfig::new(18.0, 32.0, 24.0, 1.0),
            humidity: MetricConfig::new(30.0, 80.0, 45.0, 1.0).with_bias(0.4),
            water_level: MetricConfig::new(0.0, 100.0, 80.0, 0.0),
            watering_trigger: 40.0,
            watering_recovery: 60.0,
            watering_min_ms: 6000,
            watering_max_ms: 60_000,
            watering_boost: 2.0,
            water_draw: 0.8,
            water_refill: 0.1,
            interlock_start_level: 10.0,
            interlock_stop_level: 5.0,
        }
    }
}

impl GardenConfig {
    /// Watering actuator parameters
    pub fn watering(&self) -> ActuatorConfig {
        ActuatorConfig::below(self.watering_trigger, self.watering_recovery)
            .with_active_window(
                Duration::from_millis(self.watering_min_ms),
                Duration::from_millis(self.watering_max_ms),
            )
            .with_effect(self.watering_boost)
    }

    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        non_zero_ms("garden.interval_ms", self.interval_ms)?;
        self.soil_moisture.validate()?;
        self.temperature.validate()?;
        self.humidity.validate()?;
        self.water_level.validate()?;
        self.watering().validate()?;
        if self.watering_recovery < self.watering_trigger {
            return Err(DistrictError::InvalidConfig(
                "garden.watering_recovery must not be below watering_trigger".to_string(),
            ));
        }
        if self.water_draw < 0.0 || self.water_refill < 0.0 {
            return Err(DistrictError::InvalidConfig(
                "garden reservoir rates must be non-negative".to_string(),
            ));
        }
        if self.interlock_stop_level > self.interlock_start_level {
            return Err(DistrictError::InvalidConfig(
                "garden.interlock_stop_level must not exceed interlock_start_level".to_string(),
            ));
        }
        Ok(())
    }
}

/// Water treatment plant: demand-triggered processing cycles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterPlantConfig {
    /// Plant refresh period (default: 2000)
    pub interval_ms: u64,
    /// Inflow demand in % (default: 0..100 from 50, drift 20)
    pub demand: MetricConfig,
    /// Demand above which a processing cycle starts (default: 70)
    pub processing_trigger: f64,
    /// Length of one processing cycle (default: 8000)
    pub processing_duration_ms: u64,
    /// Filtered water added per processing tick, in litres (default: 10)
    pub filtered_per_tick: f64,
    /// Output water quality in % (default: 80..99 from 95, drift 5)
    pub water_quality: MetricConfig,
    /// Filter efficiency in %, stepped once per cycle (default: 75..95 from 85, drift 3)
    pub efficiency: MetricConfig,
}

impl Default for WaterPlantConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            demand: MetricConfig::new(0.0, 100.0, 50.0, 20.0),
            processing_trigger: 70.0,
            processing_duration_ms: 8000,
            filtered_per_tick: 10.0,
            water_quality: MetricConfig::new(80.0, 99.0, 95.0, 5.0),
            efficiency: MetricConfig::new(75.0, 95.0, 85.0, 3.0),
        }
    }
}

impl WaterPlantConfig {
    /// Processing actuator parameters; cycles always run their full length
    pub fn processing(&self) -> ActuatorConfig {
        let duration = Duration::from_millis(self.processing_duration_ms);
        ActuatorConfig::above(self.processing_trigger, self.processing_trigger)
            .with_active_window(duration, duration)
    }

    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        non_zero_ms("water_plant.interval_ms", self.interval_ms)?;
        non_zero_ms(
            "water_plant.processing_duration_ms",
            self.processing_duration_ms,
        )?;
        self.demand.validate()?;
        self.water_quality.validate()?;
        self.efficiency.validate()?;
        self.processing().validate()?;
        if self.filtered_per_tick < 0.0 {
            return Err(DistrictError::InvalidConfig(
                "water_plant.filtered_per_tick must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// One street waste bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteBinConfig {
    /// Bin identifier
    pub id: String,
    /// Fill level in %
    pub fill: MetricConfig,
}

/// Waste management: filling bins and collection runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteConfig {
    /// Bin refresh period (default: 2000)
    pub interval_ms: u64,
    /// Bins (default: bin1..bin6, drift 2, filling bias 0.2)
    pub bins: Vec<WasteBinConfig>,
    /// Fill level above which a bin raises the alert and is collected (default: 80)
    pub alert_level: f64,
    /// Fill level at which collection completes (default: 5)
    pub collected_level: f64,
    /// Fill removed per tick while collecting (default: 25)
    pub collection_rate: f64,
    /// Longest collection run (default: 20000)
    pub collection_max_ms: u64,
}

impl Default for WasteConfig {
    fn default() -> Self {
        let initial = [35.0, 60.0, 20.0, 75.0, 50.0, 10.0];
        Self {
            interval_ms: 2000,
            bins: initial
                .iter()
                .enumerate()
                .map(|(i, level)| WasteBinConfig {
                    id: format!("bin{}", i + 1),
                    fill: MetricConfig::new(0.0, 100.0, *level, 2.0).with_bias(0.2),
                })
                .collect(),
            alert_level: 80.0,
            collected_level: 5.0,
            collection_rate: 25.0,
            collection_max_ms: 20_000,
        }
    }
}

impl WasteConfig {
    /// Collection actuator parameters, shared by every bin
    pub fn collection(&self) -> ActuatorConfig {
        ActuatorConfig::above(self.alert_level, self.collected_level)
            .with_active_window(Duration::ZERO, Duration::from_millis(self.collection_max_ms))
            .with_effect(-self.collection_rate)
    }

    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        non_zero_ms("waste.interval_ms", self.interval_ms)?;
        if self.bins.is_empty() {
            return Err(DistrictError::InvalidConfig(
                "waste.bins must not be empty".to_string(),
            ));
        }
        unique_ids("waste.bins", self.bins.iter().map(|b| b.id.as_str()))?;
        for bin in &self.bins {
            bin.fill.validate()?;
        }
        self.collection().validate()?;
        if self.collected_level > self.alert_level {
            return Err(DistrictError::InvalidConfig(
                "waste.collected_level must not exceed alert_level".to_string(),
            ));
        }
        if self.collection_rate < 0.0 {
            return Err(DistrictError::InvalidConfig(
                "waste.collection_rate must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// One parking lot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLotConfig {
    /// Lot identifier
    pub id: String,
    /// Total spots
    pub capacity: u32,
    /// Fewest cars ever parked
    pub min_occupied: u32,
    /// Cars parked at mount
    pub initial: u32,
    /// Chance per frame that one car arrives or leaves
    pub change_probability: f64,
}

impl ParkingLotConfig {
    /// Occupancy walk parameters
    pub fn occupancy(&self) -> MetricConfig {
        MetricConfig::new(
            self.min_occupied as f64,
            self.capacity as f64,
            self.initial as f64,
            1.0,
        )
        .discrete()
        .with_jump_probability(self.change_probability)
    }
}

/// Parking occupancy, updated per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingConfig {
    /// Lots (default: school 25/50 min 10, hospital 35/60 min 15)
    pub lots: Vec<ParkingLotConfig>,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            lots: vec![
                ParkingLotConfig {
                    id: "school".to_string(),
                    capacity: 50,
                    min_occupied: 10,
                    initial: 25,
                    change_probability: 0.005,
                },
                ParkingLotConfig {
                    id: "hospital".to_string(),
                    capacity: 60,
                    min_occupied: 15,
                    initial: 35,
                    change_probability: 0.008,
                },
            ],
        }
    }
}

impl ParkingConfig {
    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        unique_ids("parking.lots", self.lots.iter().map(|l| l.id.as_str()))?;
        for lot in &self.lots {
            if lot.capacity == 0 {
                return Err(DistrictError::InvalidConfig(format!(
                    "parking lot {} has no capacity",
                    lot.id
                )));
            }
            lot.occupancy().validate()?;
        }
        Ok(())
    }
}

/// One building activity counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Display store key
    pub key: String,
    /// Counter walk
    pub metric: MetricConfig,
}

impl CounterConfig {
    fn new(key: &str, metric: MetricConfig) -> Self {
        Self {
            key: key.to_string(),
            metric,
        }
    }
}

/// Building activity counters, updated per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Counters (default: students, patients, events, data throughput, tank level)
    pub counters: Vec<CounterConfig>,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            counters: vec![
                CounterConfig::new(
                    keys::SCHOOL_STUDENTS,
                    MetricConfig::new(1400.0, 1600.0, 1500.0, 1.0)
                        .discrete()
                        .with_jump_probability(0.01),
                ),
                CounterConfig::new(
                    keys::HOSPITAL_PATIENTS,
                    MetricConfig::new(100.0, 200.0, 150.0, 1.0)
                        .discrete()
                        .with_jump_probability(0.005),
                ),
                CounterConfig::new(
                    keys::CULTURE_EVENTS,
                    MetricConfig::new(0.0, 30.0, 12.0, 1.0)
                        .discrete()
                        .with_jump_probability(0.002),
                ),
                CounterConfig::new(
                    keys::DATACENTER_THROUGHPUT,
                    MetricConfig::new(1000.0, 3000.0, 2000.0, 100.0).with_jump_probability(0.05),
                ),
                CounterConfig::new(
                    keys::WATER_FILTER_TANK_LEVEL,
                    MetricConfig::new(50.0, 100.0, 75.0, 2.0).with_jump_probability(0.01),
                ),
            ],
        }
    }
}

impl ActivityConfig {
    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        unique_ids(
            "activity.counters",
            self.counters.iter().map(|c| c.key.as_str()),
        )?;
        for counter in &self.counters {
            counter.metric.validate()?;
        }
        Ok(())
    }
}

/// Phase of the day/night cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    #[default]
    Day,
    Night,
}

impl TimeOfDay {
    /// Display label
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Day => "day",
            TimeOfDay::Night => "night",
        }
    }

    /// The other phase
    pub fn toggled(&self) -> Self {
        match self {
            TimeOfDay::Day => TimeOfDay::Night,
            TimeOfDay::Night => TimeOfDay::Day,
        }
    }
}

/// Day/night cycle and street lighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayNightConfig {
    /// Length of one phase (default: 60000)
    pub phase_ms: u64,
    /// Phase at mount (default: day)
    pub start: TimeOfDay,
    /// Street lights on regardless of phase (default: false)
    pub street_lights_forced: bool,
}

impl Default for DayNightConfig {
    fn default() -> Self {
        Self {
            phase_ms: 60_000,
            start: TimeOfDay::Day,
            street_lights_forced: false,
        }
    }
}

impl DayNightConfig {
    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        non_zero_ms("day_night.phase_ms", self.phase_ms)
    }
}

/// Whole-district configuration.
///
/// A section set to `null` in JSON leaves that fixture unmounted; a
/// missing section takes its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistrictConfig {
    pub garden: Option<GardenConfig>,
    pub water_plant: Option<WaterPlantConfig>,
    pub waste: Option<WasteConfig>,
    pub parking: Option<ParkingConfig>,
    pub activity: Option<ActivityConfig>,
    pub day_night: Option<DayNightConfig>,
}

impl Default for DistrictConfig {
    fn default() -> Self {
        Self {
            garden: Some(GardenConfig::default()),
            water_plant: Some(WaterPlantConfig::default()),
            waste: Some(WasteConfig::default()),
            parking: Some(ParkingConfig::default()),
            activity: Some(ActivityConfig::default()),
            day_night: Some(DayNightConfig::default()),
        }
    }
}

impl DistrictConfig {
    /// Configuration with every fixture disabled
    pub fn empty() -> Self {
        Self {
            garden: None,
            water_plant: None,
            waste: None,
            parking: None,
            activity: None,
            day_night: None,
        }
    }

    /// Parse and validate JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json).map_err(|e| {
            warn!("rejected configuration {}: {}", path.display(), e);
            e
        })
    }

    /// Pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every enabled section
    pub fn validate(&self) -> Result<()> {
        if let Some(garden) = &self.garden {
            garden.validate()?;
        }
        if let Some(plant) = &self.water_plant {
            plant.validate()?;
        }
        if let Some(waste) = &self.waste {
            waste.validate()?;
        }
        if let Some(parking) = &self.parking {
            parking.validate()?;
        }
        if let Some(activity) = &self.activity {
            activity.validate()?;
        }
        if let Some(day_night) = &self.day_night {
            day_night.validate()?;
        }
        Ok(())
    }
}

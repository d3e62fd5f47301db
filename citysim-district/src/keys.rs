// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Display store keys read by overlay panels.

pub const GARDEN_SOIL_MOISTURE: &str = "garden.soil_moisture";
pub const GARDEN_TEMPERATURE: &str = "garden.temperature";
pub const GARDEN_HUMIDITY: &str = "garden.humidity";
pub const GARDEN_WATER_LEVEL: &str = "garden.water_level";
pub const GARDEN_WATERING: &str = "garden.watering";

pub const WATER_PLANT_PROCESSING: &str = "water_plant.processing";
pub const WATER_PLANT_PROCESS_TIME: &str = "water_plant.process_time";
pub const WATER_PLANT_QUALITY: &str = "water_plant.water_quality";
pub const WATER_PLANT_FILTERED: &str = "water_plant.filtered_water";
pub const WATER_PLANT_EFFICIENCY: &str = "water_plant.efficiency";
pub const WATER_PLANT_CYCLES: &str = "water_plant.cycles";

pub const WASTE_ALERT: &str = "waste.alert";
pub const WASTE_COLLECTED: &str = "waste.collected";
pub const WASTE_TRUCK_STATUS: &str = "waste.truck_status";

pub const SCHOOL_STUDENTS: &str = "school.students";
pub const HOSPITAL_PATIENTS: &str = "hospital.patients";
pub const CULTURE_EVENTS: &str = "culture.events";
pub const DATACENTER_THROUGHPUT: &str = "datacenter.throughput";
pub const WATER_FILTER_TANK_LEVEL: &str = "water_filter.tank_level";

pub const TIME_OF_DAY: &str = "time_of_day";
pub const STREET_LIGHTS: &str = "street_lights";

/// Fill level of one waste bin
pub fn waste_bin_level(bin: &str) -> String {
    format!("waste.{}.level", bin)
}

/// Whether one waste bin is being emptied
pub fn waste_bin_collecting(bin: &str) -> String {
    format!("waste.{}.collecting", bin)
}

/// Occupied spots of one parking lot
pub fn parking_occupied(lot: &str) -> String {
    format!("parking.{}.occupied", lot)
}

/// Free spots of one parking lot
pub fn parking_free(lot: &str) -> String {
    format!("parking.{}.free", lot)
}

/// Occupancy of one parking lot, in percent
pub fn parking_occupancy(lot: &str) -> String {
    format!("parking.{}.occupancy", lot)
}

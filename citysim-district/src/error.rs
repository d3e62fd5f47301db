// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for CitySim District

use thiserror::Error;

/// Main error type for district operations
#[derive(Error, Debug)]
pub enum DistrictError {
    /// Metric, actuator or scheduler rejected its parameters
    #[error("Simulation error: {0}")]
    Sim(#[from] citysim::CitySimError),

    /// Configuration file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration is well-formed but inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for district operations
pub type Result<T> = std::result::Result<T, DistrictError>;

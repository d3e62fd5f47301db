// CitySim Runner - Command-line runner for CitySim districts
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Runner errors

use citysim_district::DistrictError;
use thiserror::Error;

/// Errors that end a run
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("District error: {0}")]
    District(#[from] DistrictError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;

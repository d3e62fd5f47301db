// CitySim Runner - Command-line runner for CitySim districts
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! A district driven frame by frame.

use crate::error::{Result, RunnerError};
use citysim::{Scheduler, StoreSnapshot, TickScheduler};
use citysim_district::{District, DistrictConfig};
use serde::Serialize;
use std::time::Duration;

/// End-of-run report, printed as JSON
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub frames: u64,
    pub simulated_ms: u128,
    pub callbacks: usize,
    pub snapshot: StoreSnapshot,
}

/// Scheduler plus the district mounted on it.
pub struct Session {
    scheduler: TickScheduler,
    district: District,
    frame: Duration,
    callbacks: usize,
}

impl Session {
    /// Mount a district; `frame` is the clock step per frame
    pub fn new(config: &DistrictConfig, seed: u64, frame: Duration) -> Result<Self> {
        if frame.is_zero() {
            return Err(RunnerError::InvalidArgument(
                "frame duration must be non-zero".to_string(),
            ));
        }
        let scheduler = TickScheduler::new();
        let district = District::mount(config, &scheduler, seed)?;
        Ok(Self {
            scheduler,
            district,
            frame,
            callbacks: 0,
        })
    }

    /// Advance one frame; returns the callbacks fired
    pub fn step(&mut self) -> usize {
        let fired = self.scheduler.advance(self.frame);
        self.callbacks += fired;
        fired
    }

    /// Simulated clock
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Frames completed
    pub fn frames(&self) -> u64 {
        self.scheduler.frame()
    }

    /// Clock step per frame
    pub fn frame_duration(&self) -> Duration {
        self.frame
    }

    /// Mounted district
    pub fn district(&self) -> &District {
        &self.district
    }

    /// Mounted district, mutably (to unmount fixtures)
    #[cfg(test)]
    pub fn district_mut(&mut self) -> &mut District {
        &mut self.district
    }

    /// Current readings
    pub fn snapshot(&self) -> StoreSnapshot {
        self.district.snapshot()
    }

    /// Report for the run so far
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.district.seed(),
            frames: self.frames(),
            simulated_ms: self.now().as_millis(),
            callbacks: self.callbacks,
            snapshot: self.snapshot(),
        }
    }
}

/// Frames needed to cover `duration`, at least one
pub fn frames_for(duration: Duration, frame: Duration) -> u64 {
    if frame.is_zero() {
        return 0;
    }
    u64::try_from(duration.as_nanos() / frame.as_nanos())
        .unwrap_or(u64::MAX)
        .max(1)
}

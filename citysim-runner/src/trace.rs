// CitySim Runner - Command-line runner for CitySim districts
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! CSV trace export.
//!
//! One row per sample: simulated time, frame number, then one column per
//! selected store key. Missing readings are left empty.

use crate::error::Result;
use citysim::{Reading, StoreSnapshot};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Writes store snapshots as CSV rows.
pub struct TraceWriter<W: Write> {
    writer: csv::Writer<W>,
    keys: Vec<String>,
    rows: usize,
}

impl TraceWriter<File> {
    /// Create (or truncate) a trace file
    pub fn create(path: impl AsRef<Path>, keys: Vec<String>) -> Result<Self> {
        Self::new(File::create(path)?, keys)
    }
}

impl<W: Write> TraceWriter<W> {
    /// Wrap a writer and emit the header row
    pub fn new(inner: W, keys: Vec<String>) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        let mut header = vec!["time_ms".to_string(), "frame".to_string()];
        header.extend(keys.iter().cloned());
        writer.write_record(&header)?;
        Ok(Self {
            writer,
            keys,
            rows: 0,
        })
    }

    /// Columns after `time_ms` and `frame`
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Rows written so far, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append one sample
    pub fn record(&mut self, now: Duration, frame: u64, snapshot: &StoreSnapshot) -> Result<()> {
        let mut row = Vec::with_capacity(self.keys.len() + 2);
        row.push(now.as_millis().to_string());
        row.push(frame.to_string());
        for key in &self.keys {
            row.push(match snapshot.readings.get(key) {
                Some(Reading::Number(value)) => format!("{:.3}", value),
                Some(reading) => reading.to_string(),
                None => String::new(),
            });
        }
        self.writer.write_record(&row)?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()).into())
    }
}

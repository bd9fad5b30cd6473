// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Location log (GPS ping) model.

use crate::models::Coordinates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped GPS observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy in meters
    pub accuracy: Option<f64>,
    /// Ground speed in meters per second
    pub speed: Option<f64>,
    /// Degrees clockwise from north
    pub bearing: Option<f64>,
    /// Percent, 0-100
    pub battery_level: Option<u8>,
}

impl Ping {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A stored ping. Append-only; never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationLog {
    pub id: u64,
    pub project_id: u64,
    pub course_name: String,
    pub device_id: Option<String>,
    #[serde(flatten)]
    pub ping: Ping,
}

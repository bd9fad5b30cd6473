// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Route stop model and its visit state machine.

use crate::time_utils::ClockTime;
use geo::Point;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// As a `geo` point (x = longitude, y = latitude).
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

impl From<Point<f64>> for Coordinates {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

/// Where a stop is in its arrival/departure lifecycle.
///
/// A departure time can only exist alongside an arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VisitState {
    #[default]
    Unvisited,
    Arrived {
        arrived_at: ClockTime,
        departed_at: Option<ClockTime>,
    },
}

impl VisitState {
    pub fn is_arrived(&self) -> bool {
        matches!(self, VisitState::Arrived { .. })
    }

    pub fn arrived_at(&self) -> Option<ClockTime> {
        match self {
            VisitState::Arrived { arrived_at, .. } => Some(*arrived_at),
            VisitState::Unvisited => None,
        }
    }

    pub fn departed_at(&self) -> Option<ClockTime> {
        match self {
            VisitState::Arrived { departed_at, .. } => *departed_at,
            VisitState::Unvisited => None,
        }
    }
}

/// One imported route row, as it appears in the uploaded route sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub course_name: String,
    /// Opaque ordering label ("1", "2", "出発", ...)
    pub sequence: String,
    /// Scheduled arrival as written in the sheet (`HH:MM`, not validated)
    pub scheduled_arrival: Option<String>,
    pub stop_name: String,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub stay_minutes: Option<u32>,
    pub weight_kg: Option<i64>,
    /// Free-text status column from the sheet
    pub status_note: Option<String>,
    pub phone_number: Option<String>,
    pub note1: Option<String>,
    pub note2: Option<String>,
    pub note3: Option<String>,
    pub desired_time_start: Option<String>,
    pub desired_time_end: Option<String>,
}

/// A stored stop: the imported record plus its live visit state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: u64,
    pub project_id: u64,
    #[serde(flatten)]
    pub record: StopRecord,
    #[serde(flatten)]
    pub visit: VisitState,
}

impl Stop {
    pub fn name(&self) -> &str {
        &self.record.stop_name
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.record.coordinates
    }

    pub fn is_arrived(&self) -> bool {
        self.visit.is_arrived()
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! "Between stop A and stop B" progress estimation.

use crate::models::{Ping, Stop};
use crate::services::geodesy;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stop referenced by its position in the course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopRef {
    pub index: usize,
    pub stop_id: u64,
    pub name: String,
}

impl StopRef {
    fn new(index: usize, stop: &Stop) -> Self {
        Self {
            index,
            stop_id: stop.id,
            name: stop.name().to_string(),
        }
    }
}

/// Where the vehicle is along its course, as of the latest ping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Most advanced arrived stop; `None` before departure
    pub from_stop: Option<StopRef>,
    /// First stop not yet visited; `None` once every stop is arrived
    pub to_stop: Option<StopRef>,
    pub distance_km: Option<f64>,
    pub eta_minutes: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters per second
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressSnapshot {
    pub fn route_complete(&self) -> bool {
        self.to_stop.is_none()
    }
}

/// Index of the last arrived stop in course order.
pub fn last_arrived_index(stops: &[Stop]) -> Option<usize> {
    stops.iter().rposition(Stop::is_arrived)
}

/// Index of the first stop in course order that has not been arrived at.
///
/// A skipped stop stays pending, so this can precede [`last_arrived_index`].
pub fn first_pending_index(stops: &[Stop]) -> Option<usize> {
    stops.iter().position(|s| !s.is_arrived())
}

/// Minutes to cover `distance_km` at `speed_mps`; `None` when not moving.
pub fn eta_minutes(distance_km: f64, speed_mps: Option<f64>) -> Option<f64> {
    speed_mps
        .filter(|s| *s > 0.0)
        .map(|speed| distance_km * 1000.0 / speed / 60.0)
}

/// Estimate progress from the latest ping. Returns `None` for a course with
/// no stops.
pub fn estimate(ping: &Ping, stops: &[Stop]) -> Option<ProgressSnapshot> {
    if stops.is_empty() {
        return None;
    }

    let from = last_arrived_index(stops);
    let to = first_pending_index(stops);

    let distance_km = to
        .and_then(|i| stops[i].coordinates())
        .map(|target| geodesy::distance_km(ping.coordinates(), target));
    let eta = distance_km.and_then(|d| eta_minutes(d, ping.speed));

    Some(ProgressSnapshot {
        from_stop: from.map(|i| StopRef::new(i, &stops[i])),
        to_stop: to.map(|i| StopRef::new(i, &stops[i])),
        distance_km,
        eta_minutes: eta,
        latitude: ping.latitude,
        longitude: ping.longitude,
        speed: ping.speed,
        timestamp: ping.timestamp,
    })
}

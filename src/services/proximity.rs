// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! "How many stops away, how late" for a single target stop.

use crate::models::Stop;
use crate::services::progress::last_arrived_index;
use crate::time_utils::{parse_minutes_or_zero, ClockTime};
use serde::Serialize;

/// Label reported when no stop has been reached yet.
pub const BEFORE_DEPARTURE: &str = "before departure";

/// The most advanced arrived stop and its times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastArrived {
    pub index: usize,
    pub stop_id: u64,
    pub name: String,
    pub scheduled_arrival: Option<String>,
    pub arrived_at: Option<ClockTime>,
    pub departed_at: Option<ClockTime>,
}

/// Position of the vehicle relative to one target stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximitySnapshot {
    /// Positive: still ahead. Zero: at (or just left) the target. Negative: passed.
    pub stops_away: i64,
    /// Name of the last arrived stop, or [`BEFORE_DEPARTURE`]
    pub current_stop: String,
    pub last_arrived: Option<LastArrived>,
    /// Lateness at the last arrived stop, in minutes
    pub delay_minutes: Option<i32>,
}

/// Estimate proximity to `target_stop_id`. Returns `None` when the target is
/// not part of `stops`.
///
/// Callers report "no location data" separately when the course has no pings.
pub fn estimate(stops: &[Stop], target_stop_id: u64) -> Option<ProximitySnapshot> {
    let target = stops.iter().position(|s| s.id == target_stop_id)? as i64;

    let Some(last) = last_arrived_index(stops) else {
        return Some(ProximitySnapshot {
            stops_away: target + 1,
            current_stop: BEFORE_DEPARTURE.to_string(),
            last_arrived: None,
            delay_minutes: None,
        });
    };

    let stop = &stops[last];
    Some(ProximitySnapshot {
        stops_away: target - last as i64,
        current_stop: stop.name().to_string(),
        last_arrived: Some(LastArrived {
            index: last,
            stop_id: stop.id,
            name: stop.name().to_string(),
            scheduled_arrival: stop.record.scheduled_arrival.clone(),
            arrived_at: stop.visit.arrived_at(),
            departed_at: stop.visit.departed_at(),
        }),
        delay_minutes: delay_minutes(stop),
    })
}

/// Actual minus scheduled arrival; unparsable schedules count as midnight.
fn delay_minutes(stop: &Stop) -> Option<i32> {
    let scheduled = stop.record.scheduled_arrival.as_deref()?;
    let actual = stop.visit.arrived_at()?;
    Some(actual.minutes_of_day() - parse_minutes_or_zero(scheduled))
}

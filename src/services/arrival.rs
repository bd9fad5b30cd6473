// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geofence-based arrival/departure detection.
//!
//! Every ping is checked against every stop of its course that has
//! coordinates. Per stop:
//!
//! - `Unvisited` and inside the geofence: arrive at the ping's local time
//! - arrived, not departed, and outside: depart at the ping's local time
//! - arrived, departed, and inside again: cancel the departure
//!
//! There is no hysteresis band. Pings that do not cross the geofence edge
//! change nothing, so re-evaluating the same ping is harmless.
//!
//! Evaluations for one course must not interleave; [`CourseLocks`] provides
//! the per-course serialization.

use crate::db::Store;
use crate::error::AppError;
use crate::models::{CourseKey, Ping, Stop, VisitState};
use crate::services::geodesy;
use crate::time_utils::ClockTime;
use chrono::FixedOffset;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A change to one stop's visit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Arrive(ClockTime),
    Depart(ClockTime),
    CancelDeparture,
}

/// A transition bound to the stop it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTransition {
    pub stop_id: u64,
    pub transition: Transition,
}

/// Decide how one stop reacts to a ping at local time `at`.
pub fn transition(visit: &VisitState, within_range: bool, at: ClockTime) -> Option<Transition> {
    match (visit, within_range) {
        (VisitState::Unvisited, true) => Some(Transition::Arrive(at)),
        (
            VisitState::Arrived {
                departed_at: None, ..
            },
            false,
        ) => Some(Transition::Depart(at)),
        (
            VisitState::Arrived {
                departed_at: Some(_),
                ..
            },
            true,
        ) => Some(Transition::CancelDeparture),
        _ => None,
    }
}

/// Apply a transition to a visit state.
pub fn apply(visit: VisitState, transition: Transition) -> VisitState {
    match (visit, transition) {
        (_, Transition::Arrive(at)) => VisitState::Arrived {
            arrived_at: at,
            departed_at: None,
        },
        (VisitState::Arrived { arrived_at, .. }, Transition::Depart(at)) => VisitState::Arrived {
            arrived_at,
            departed_at: Some(at),
        },
        (VisitState::Arrived { arrived_at, .. }, Transition::CancelDeparture) => {
            VisitState::Arrived {
                arrived_at,
                departed_at: None,
            }
        }
        (VisitState::Unvisited, _) => VisitState::Unvisited,
    }
}

/// Evaluate one ping against a course's stops.
///
/// `threshold_m` is the geofence radius; a stop is in range when the ping is
/// strictly closer than that. Stops without coordinates never transition.
pub fn evaluate(
    ping: &Ping,
    stops: &[Stop],
    threshold_m: f64,
    offset: FixedOffset,
) -> Vec<StopTransition> {
    let at = ClockTime::from_timestamp(ping.timestamp, offset);
    let here = ping.coordinates();

    stops
        .iter()
        .filter_map(|stop| {
            let distance = geodesy::distance_m(here, stop.coordinates()?);
            transition(&stop.visit, distance < threshold_m, at).map(|transition| StopTransition {
                stop_id: stop.id,
                transition,
            })
        })
        .collect()
}

/// Persist transitions. A failed write is logged and skipped; returns the
/// number applied.
pub async fn persist(store: &dyn Store, transitions: &[StopTransition]) -> usize {
    let mut applied = 0;
    for t in transitions {
        let result = match t.transition {
            Transition::Arrive(at) => store.mark_stop_arrived(t.stop_id, at).await,
            Transition::Depart(at) => store.mark_stop_departed(t.stop_id, at).await,
            Transition::CancelDeparture => store.clear_stop_departure(t.stop_id).await,
        };
        match result {
            Ok(()) => {
                tracing::info!(stop_id = t.stop_id, transition = ?t.transition, "Stop transition");
                applied += 1;
            }
            Err(e) => {
                tracing::warn!(stop_id = t.stop_id, error = %e, "Failed to persist stop transition");
            }
        }
    }
    applied
}

/// Load the course's stops, evaluate `ping`, and persist the result.
///
/// Callers must hold the course lock.
pub async fn process_ping(
    store: &dyn Store,
    course: &CourseKey,
    ping: &Ping,
    threshold_m: f64,
    offset: FixedOffset,
) -> Result<Vec<StopTransition>, AppError> {
    let stops = store.list_stops(course).await?;
    let transitions = evaluate(ping, &stops, threshold_m, offset);
    persist(store, &transitions).await;
    Ok(transitions)
}

/// Per-course mutexes serializing arrival evaluation.
#[derive(Clone, Default)]
pub struct CourseLocks {
    locks: Arc<DashMap<CourseKey, Arc<Mutex<()>>>>,
}

impl CourseLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `course`.
    pub async fn lock(&self, course: &CourseKey) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(course.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

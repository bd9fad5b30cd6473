// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tag photos with the nearest stop inside the geofence.

use crate::models::{Coordinates, Stop};
use crate::services::geodesy;

/// The stop a photo was matched to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoMatch<'a> {
    pub stop: &'a Stop,
    pub distance_m: f64,
}

/// Find the nearest stop within `threshold_m` of `at`.
///
/// A stop exactly at the threshold counts. On equal distances the stop
/// listed first wins. No stop in range is a normal outcome.
pub fn nearest_stop(at: Coordinates, stops: &[Stop], threshold_m: f64) -> Option<PhotoMatch<'_>> {
    let mut best: Option<PhotoMatch<'_>> = None;

    for stop in stops {
        let Some(coordinates) = stop.coordinates() else {
            continue;
        };
        let distance_m = geodesy::distance_m(at, coordinates);
        if distance_m > threshold_m {
            continue;
        }
        if best.map_or(true, |b| distance_m < b.distance_m) {
            best = Some(PhotoMatch { stop, distance_m });
        }
    }

    best
}

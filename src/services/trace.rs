// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Synthetic GPS trace generation.
//!
//! Produces a believable day of pings for a course: the vehicle parks at
//! each stop for its planned stay, then drives the real road path to the
//! next stop so that it arrives on schedule. Paths come from a
//! [`RouteProvider`]; segments whose route cannot be fetched are skipped.
//!
//! Output order is segment by segment, the way a device uploads batches.

use crate::db::Store;
use crate::error::AppError;
use crate::models::{Coordinates, CourseKey, Ping, Stop};
use crate::services::arrival::CourseLocks;
use crate::services::directions::{RoutePath, RouteProvider};
use crate::services::geodesy;
use crate::time_utils::ClockTime;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use futures_util::{stream, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;

/// Route requests in flight at once.
const MAX_CONCURRENT_ROUTE_REQUESTS: usize = 4;

/// Coordinate noise while parked (about ±5 m).
const STAY_JITTER_DEG: f64 = 0.0001;

/// Coordinate noise while driving (about ±2 m).
const MOVE_JITTER_DEG: f64 = 0.00005;

/// Walking-pace upper bound for parked speed noise, in m/s (3 km/h).
const STAY_MAX_SPEED_MPS: f64 = 0.83;

const STAY_BATTERY_DRAIN_PROBABILITY: f64 = 0.1;
const MOVE_BATTERY_DRAIN_PROBABILITY: f64 = 0.05;

/// Parameters of one generation run.
#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// Day the scheduled `HH:MM` times are placed on
    pub date: NaiveDate,
    /// Offset the scheduled times are written in
    pub offset: FixedOffset,
    /// Seconds between parked pings
    pub interval_secs: u32,
    /// Upper bound on each route request
    pub route_timeout: Duration,
    /// Fixed seed for reproducible traces
    pub seed: Option<u64>,
}

/// Result of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub deleted_logs: usize,
    pub route_segments: usize,
    pub generated_logs: usize,
}

/// Builds pings for a course. Holds the RNG and the simulated battery.
pub struct TraceGenerator<'a> {
    provider: &'a dyn RouteProvider,
    options: TraceOptions,
    rng: StdRng,
    battery: u8,
}

impl<'a> TraceGenerator<'a> {
    pub fn new(provider: &'a dyn RouteProvider, options: TraceOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            provider,
            options,
            rng,
            battery: 100,
        }
    }

    /// Build the full trace. Returns the number of segments whose route was
    /// fetched, and the pings.
    pub async fn build(&mut self, stops: &[Stop]) -> (usize, Vec<Ping>) {
        let routes = self.fetch_routes(stops).await;

        let mut segments = 0;
        let mut pings = Vec::new();

        for (i, (pair, route)) in stops.windows(2).zip(routes).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            let Some(route) = route else { continue };
            segments += 1;

            let departure = self.scheduled(from)
                + TimeDelta::minutes(i64::from(from.record.stay_minutes.unwrap_or(0)));
            let arrival = self.scheduled(to);

            if i == 0 {
                pings.extend(self.stay_pings(from));
            }
            pings.extend(self.movement_pings(&route.points, departure, arrival));
            pings.extend(self.stay_pings(to));
        }

        (segments, pings)
    }

    /// Fetch a route for every consecutive stop pair, preserving order.
    /// `None` marks a pair that is skipped.
    async fn fetch_routes(&self, stops: &[Stop]) -> Vec<Option<RoutePath>> {
        let requests: Vec<_> = stops
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                fetch_segment(self.provider, self.options.route_timeout, i, &pair[0], &pair[1])
            })
            .collect();

        stream::iter(requests)
            .buffered(MAX_CONCURRENT_ROUTE_REQUESTS)
            .collect()
            .await
    }

    /// Scheduled arrival as an absolute time; missing times mean midnight.
    fn scheduled(&self, stop: &Stop) -> DateTime<Utc> {
        stop.record
            .scheduled_arrival
            .as_deref()
            .and_then(|t| t.parse::<ClockTime>().ok())
            .unwrap_or(ClockTime::from_minutes(0))
            .on_date(self.options.date, self.options.offset)
    }

    /// Parked pings: one every interval across the planned stay, at least two.
    fn stay_pings(&mut self, stop: &Stop) -> Vec<Ping> {
        let Some(at) = stop.coordinates() else {
            return Vec::new();
        };
        let start = self.scheduled(stop);
        let interval = i64::from(self.options.interval_secs);
        let stay_secs = i64::from(stop.record.stay_minutes.unwrap_or(0)) * 60;
        let count = (stay_secs / interval).max(1);

        (0..=count)
            .map(|i| {
                let ping = Ping {
                    latitude: at.latitude + self.jitter(STAY_JITTER_DEG),
                    longitude: at.longitude + self.jitter(STAY_JITTER_DEG),
                    timestamp: start + TimeDelta::seconds(i * interval),
                    accuracy: Some(self.accuracy()),
                    speed: Some(self.rng.gen::<f64>() * STAY_MAX_SPEED_MPS),
                    bearing: None,
                    battery_level: Some(self.battery),
                };
                self.drain_battery(STAY_BATTERY_DRAIN_PROBABILITY);
                ping
            })
            .collect()
    }

    /// Driving pings along `points`, timed so the vehicle covers the path
    /// at constant speed between `departure` and `arrival`.
    fn movement_pings(
        &mut self,
        points: &[Coordinates],
        departure: DateTime<Utc>,
        arrival: DateTime<Utc>,
    ) -> Vec<Ping> {
        let window = arrival - departure;
        if points.len() < 2 || window <= TimeDelta::zero() {
            return Vec::new();
        }

        let total_km: f64 = points
            .windows(2)
            .map(|w| geodesy::distance_km(w[0], w[1]))
            .sum();
        if total_km == 0.0 {
            return Vec::new();
        }

        let window_ms = window.num_milliseconds() as f64;
        let mut pings: Vec<Ping> = Vec::with_capacity(points.len());
        let mut covered_km = 0.0;

        for (i, point) in points.iter().enumerate() {
            let (timestamp, speed, bearing) = if i == 0 {
                (departure, 0.0, 0.0)
            } else {
                let step_km = geodesy::distance_km(points[i - 1], *point);
                covered_km += step_km;
                let offset_ms = (window_ms * covered_km / total_km).round() as i64;
                let timestamp = departure + TimeDelta::milliseconds(offset_ms);

                let previous = pings.last().map_or(departure, |p| p.timestamp);
                let dt_secs = (timestamp - previous).num_milliseconds() as f64 / 1000.0;
                let speed = if dt_secs > 0.0 {
                    step_km * 1000.0 / dt_secs * (0.95 + self.rng.gen::<f64>() * 0.1)
                } else {
                    0.0
                };
                (timestamp, speed, geodesy::initial_bearing(points[i - 1], *point))
            };

            pings.push(Ping {
                latitude: point.latitude + self.jitter(MOVE_JITTER_DEG),
                longitude: point.longitude + self.jitter(MOVE_JITTER_DEG),
                timestamp,
                accuracy: Some(self.accuracy()),
                speed: Some(speed),
                bearing: Some(bearing),
                battery_level: Some(self.battery),
            });
            self.drain_battery(MOVE_BATTERY_DRAIN_PROBABILITY);
        }

        pings
    }

    /// Uniform noise in `[-span/2, span/2)`.
    fn jitter(&mut self, span: f64) -> f64 {
        (self.rng.gen::<f64>() - 0.5) * span
    }

    /// Reported horizontal accuracy, 5-15 m.
    fn accuracy(&mut self) -> f64 {
        5.0 + self.rng.gen::<f64>() * 10.0
    }

    fn drain_battery(&mut self, probability: f64) {
        if self.battery > 0 && self.rng.gen_bool(probability) {
            self.battery -= 1;
        }
    }
}

/// Fetch one segment's route. Missing coordinates, provider errors and
/// timeouts all skip the segment.
async fn fetch_segment(
    provider: &dyn RouteProvider,
    timeout: Duration,
    segment: usize,
    from: &Stop,
    to: &Stop,
) -> Option<RoutePath> {
    let (Some(origin), Some(destination)) = (from.coordinates(), to.coordinates()) else {
        tracing::warn!(
            segment,
            from = from.name(),
            to = to.name(),
            "Skipping segment without coordinates"
        );
        return None;
    };

    match tokio::time::timeout(timeout, provider.route(origin, destination)).await {
        Ok(Ok(route)) => {
            tracing::debug!(
                segment,
                points = route.points.len(),
                distance_m = route.distance_meters,
                "Fetched route segment"
            );
            Some(route)
        }
        Ok(Err(e)) if e.is_routing_error() => {
            tracing::warn!(segment, error = %e, "Route request failed");
            None
        }
        Ok(Err(e)) => {
            tracing::error!(segment, error = %e, "Route provider failed");
            None
        }
        Err(_) => {
            tracing::warn!(segment, error = AppError::ROUTING_TIMEOUT, "Route request failed");
            None
        }
    }
}

/// Replace the course's location history with a synthetic trace.
pub async fn generate(
    store: &dyn Store,
    provider: &dyn RouteProvider,
    locks: &CourseLocks,
    course: &CourseKey,
    options: TraceOptions,
) -> Result<TraceSummary, AppError> {
    let stops = store.list_stops(course).await?;
    if stops.len() < 2 {
        return Err(AppError::BadRequest(format!(
            "At least 2 stops required, got {}",
            stops.len()
        )));
    }

    let mut generator = TraceGenerator::new(provider, options);
    let (route_segments, pings) = generator.build(&stops).await;

    let _guard = locks.lock(course).await;
    let deleted_logs = store.delete_locations(course).await?;

    let mut generated_logs = 0;
    for ping in pings {
        match store.append_location(course, None, ping).await {
            Ok(_) => generated_logs += 1,
            Err(e) => tracing::warn!(error = %e, "Failed to store generated ping"),
        }
    }

    tracing::info!(
        project_id = course.project_id,
        course = %course.course_name,
        deleted_logs,
        route_segments,
        generated_logs,
        "Generated synthetic trace"
    );

    Ok(TraceSummary {
        deleted_logs,
        route_segments,
        generated_logs,
    })
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin API for courses: route sheet upload, live status, reset and
//! synthetic trace generation.

use crate::error::{AppError, Result};
use crate::models::{CourseKey, CourseSummary, Stop};
use crate::routes::projects::load_project;
use crate::services::progress::{self, ProgressSnapshot};
use crate::services::proximity::{self, ProximitySnapshot};
use crate::services::route_import::{self, ImportOptions};
use crate::services::{arrival, trace, TraceOptions, TraceSummary};
use crate::time_utils::ClockTime;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/projects/{id}/courses", get(list_courses))
        .route("/api/projects/{id}/courses/upload", post(upload_routes))
        .route("/api/projects/{id}/courses/{course}", get(show_course))
        .route(
            "/api/projects/{id}/courses/{course}/location",
            get(current_location),
        )
        .route(
            "/api/projects/{id}/courses/{course}/stops/{stop_id}/status",
            get(stop_status),
        )
        .route("/api/projects/{id}/courses/{course}/reset", post(reset_course))
        .route("/api/projects/{id}/courses/{course}/trace", post(generate_trace))
}

// ─── Upload ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct UploadQuery {
    #[serde(default)]
    has_header: bool,
    #[serde(default)]
    skip_departure: bool,
    /// Shift every course to start at this `HH:MM`
    start_time: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub imported: usize,
    pub courses: Vec<CourseSummary>,
}

/// Replace every stop of the project with the uploaded route sheet.
async fn upload_routes(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<u64>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<UploadResponse>> {
    load_project(&state, project_id).await?;

    let start_time = match query.start_time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<ClockTime>().map_err(|e| {
            AppError::BadRequest(format!("Invalid start_time: {}", e))
        })?),
    };

    let options = ImportOptions {
        has_header: query.has_header,
        skip_departure: query.skip_departure,
        start_time,
    };
    let records = tokio::task::spawn_blocking(move || route_import::import(&body, options))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Route import task failed: {}", e)))?
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let imported = state.db.replace_stops(project_id, records).await?;
    let courses = state.db.list_courses(project_id).await?;

    tracing::info!(
        project_id,
        imported,
        courses = courses.len(),
        "Imported route sheet"
    );
    Ok(Json(UploadResponse { imported, courses }))
}

// ─── Course Views ────────────────────────────────────────────

async fn list_courses(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<u64>,
) -> Result<Json<Vec<CourseSummary>>> {
    load_project(&state, project_id).await?;
    Ok(Json(state.db.list_courses(project_id).await?))
}

#[derive(Serialize)]
pub struct CourseResponse {
    pub course_name: String,
    pub stops: Vec<Stop>,
}

async fn show_course(
    State(state): State<Arc<AppState>>,
    Path((project_id, course_name)): Path<(u64, String)>,
) -> Result<Json<CourseResponse>> {
    load_project(&state, project_id).await?;
    let course = CourseKey::new(project_id, course_name);
    let stops = state.db.list_stops(&course).await?;
    if stops.is_empty() {
        return Err(AppError::NotFound(format!(
            "Course {} not found",
            course.course_name
        )));
    }

    Ok(Json(CourseResponse {
        course_name: course.course_name,
        stops,
    }))
}

#[derive(Serialize)]
pub struct LocationResponse {
    pub course_name: String,
    /// `None` until the course has a ping
    pub location: Option<ProgressSnapshot>,
    pub route_complete: bool,
    pub stops: Vec<Stop>,
}

/// Current progress along the course.
///
/// The latest ping is re-evaluated first, so stop states are current even if
/// the ping arrived through a path that skipped arrival detection.
async fn current_location(
    State(state): State<Arc<AppState>>,
    Path((project_id, course_name)): Path<(u64, String)>,
) -> Result<Json<LocationResponse>> {
    let project = load_project(&state, project_id).await?;
    let course = CourseKey::new(project_id, course_name);
    let threshold = project.arrival_threshold(state.config.default_arrival_threshold_meters);

    let _guard = state.course_locks.lock(&course).await;

    let latest = state.db.latest_location(&course).await?;
    if let Some(log) = &latest {
        arrival::process_ping(
            state.db.as_ref(),
            &course,
            &log.ping,
            threshold,
            state.config.local_offset(),
        )
        .await?;
    }

    let stops = state.db.list_stops(&course).await?;
    let location = latest.and_then(|log| progress::estimate(&log.ping, &stops));
    let route_complete = location
        .as_ref()
        .is_some_and(ProgressSnapshot::route_complete);

    tracing::debug!(
        project_id,
        course = %course.course_name,
        has_location = location.is_some(),
        route_complete,
        "Computed course progress"
    );
    Ok(Json(LocationResponse {
        course_name: course.course_name,
        location,
        route_complete,
        stops,
    }))
}

#[derive(Serialize)]
pub struct StopStatusResponse {
    pub stop_id: u64,
    pub has_location: bool,
    #[serde(flatten)]
    pub proximity: Option<ProximitySnapshot>,
}

/// How far the vehicle is from one stop, and how late it is running.
async fn stop_status(
    State(state): State<Arc<AppState>>,
    Path((project_id, course_name, stop_id)): Path<(u64, String, u64)>,
) -> Result<Json<StopStatusResponse>> {
    load_project(&state, project_id).await?;
    let course = CourseKey::new(project_id, course_name);

    let not_found = || AppError::NotFound(format!("Stop {} not found", stop_id));
    let stop = state.db.get_stop(stop_id).await?.ok_or_else(not_found)?;
    if stop.project_id != project_id || stop.record.course_name != course.course_name {
        return Err(not_found());
    }

    if state.db.latest_location(&course).await?.is_none() {
        return Ok(Json(StopStatusResponse {
            stop_id,
            has_location: false,
            proximity: None,
        }));
    }

    let stops = state.db.list_stops(&course).await?;
    let proximity = proximity::estimate(&stops, stop_id).ok_or_else(not_found)?;

    Ok(Json(StopStatusResponse {
        stop_id,
        has_location: true,
        proximity: Some(proximity),
    }))
}

// ─── Maintenance ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct ResetResponse {
    pub course_name: String,
    pub reset_stops: usize,
}

/// Force every stop of the course back to unvisited.
async fn reset_course(
    State(state): State<Arc<AppState>>,
    Path((project_id, course_name)): Path<(u64, String)>,
) -> Result<Json<ResetResponse>> {
    load_project(&state, project_id).await?;
    let course = CourseKey::new(project_id, course_name);

    let _guard = state.course_locks.lock(&course).await;
    let reset_stops = state.db.reset_course(&course).await?;

    tracing::info!(project_id, course = %course.course_name, reset_stops, "Reset course");
    Ok(Json(ResetResponse {
        course_name: course.course_name,
        reset_stops,
    }))
}

#[derive(Deserialize)]
struct TraceRequest {
    /// Day to place the schedule on; defaults to today (local)
    date: Option<NaiveDate>,
    interval_secs: Option<u32>,
    seed: Option<u64>,
}

/// Replace the course's pings with a synthetic trace.
async fn generate_trace(
    State(state): State<Arc<AppState>>,
    Path((project_id, course_name)): Path<(u64, String)>,
    Json(req): Json<TraceRequest>,
) -> Result<Json<TraceSummary>> {
    load_project(&state, project_id).await?;
    let provider = state
        .directions
        .clone()
        .ok_or_else(|| AppError::BadRequest("Directions API key not configured".to_string()))?;

    let interval_secs = req.interval_secs.unwrap_or(state.config.trace_interval_secs);
    if interval_secs == 0 {
        return Err(AppError::BadRequest(
            "interval_secs must be positive".to_string(),
        ));
    }

    let offset = state.config.local_offset();
    let options = TraceOptions {
        date: req
            .date
            .unwrap_or_else(|| Utc::now().with_timezone(&offset).date_naive()),
        offset,
        interval_secs,
        route_timeout: state.config.route_request_timeout(),
        seed: req.seed,
    };

    let course = CourseKey::new(project_id, course_name);
    let summary = trace::generate(
        state.db.as_ref(),
        provider.as_ref(),
        &state.course_locks,
        &course,
        options,
    )
    .await?;

    Ok(Json(summary))
}

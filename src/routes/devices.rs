// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device API: registration, ping upload and photo metadata.
//!
//! Every route here requires `X-Project-Api-Key` (applied in routes/mod.rs).

use crate::error::Result;
use crate::middleware::DeviceProject;
use crate::services::ingest::{self, LocationInput, MatchedStop, PhotoInput};
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/devices", post(register_device))
        .route("/api/v1/locations", post(create_locations))
        .route("/api/v1/photos", post(create_photo))
}

// ─── Device Registration ─────────────────────────────────────

#[derive(Deserialize)]
struct RegisterDeviceRequest {
    #[serde(default)]
    device_id: String,
    device_name: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterDeviceResponse {
    pub success: bool,
    pub device_id: String,
    pub course_name: Option<String>,
    pub message: String,
}

/// Register a device. Re-registering returns the current assignment.
async fn register_device(
    State(state): State<Arc<AppState>>,
    Extension(DeviceProject(project)): Extension<DeviceProject>,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<Json<RegisterDeviceResponse>> {
    let (device, created) =
        ingest::register_device(state.db.as_ref(), &project, &req.device_id, req.device_name)
            .await?;

    let assignment = match device.assigned_course() {
        Some(course) => format!("Assigned to course: {}", course),
        None => "No course assigned yet.".to_string(),
    };
    let message = if created {
        format!("Device registered. {}", assignment)
    } else {
        format!("Device already registered. {}", assignment)
    };

    Ok(Json(RegisterDeviceResponse {
        success: true,
        course_name: device.assigned_course().map(str::to_string),
        device_id: device.device_id,
        message,
    }))
}

// ─── Locations ───────────────────────────────────────────────

#[derive(Deserialize)]
struct LocationRequest {
    #[serde(default)]
    device_id: String,
    #[serde(default)]
    locations: Vec<LocationInput>,
}

#[derive(Serialize)]
pub struct LocationResponse {
    pub success: bool,
    pub recorded: usize,
    pub message: String,
}

/// Record a batch of pings for the device's course.
async fn create_locations(
    State(state): State<Arc<AppState>>,
    Extension(DeviceProject(project)): Extension<DeviceProject>,
    Json(req): Json<LocationRequest>,
) -> Result<Json<LocationResponse>> {
    let outcome = ingest::record_locations(
        state.db.as_ref(),
        &state.course_locks,
        &project,
        &req.device_id,
        req.locations,
        state.ingest_settings(),
    )
    .await?;

    Ok(Json(LocationResponse {
        success: true,
        recorded: outcome.recorded,
        message: format!("{} locations recorded", outcome.recorded),
    }))
}

// ─── Photos ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PhotoResponse {
    pub success: bool,
    pub photo_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_stop: Option<MatchedStop>,
    pub message: String,
}

/// Record photo metadata and tag it with the nearest stop.
async fn create_photo(
    State(state): State<Arc<AppState>>,
    Extension(DeviceProject(project)): Extension<DeviceProject>,
    Json(req): Json<PhotoInput>,
) -> Result<Json<PhotoResponse>> {
    let outcome =
        ingest::record_photo(state.db.as_ref(), &project, req, state.ingest_settings()).await?;

    let message = match &outcome.matched_stop {
        Some(stop) => format!("Photo registered and matched to stop: {}", stop.stop_name),
        None => "Photo registered but no matching stop found within threshold".to_string(),
    };

    Ok(Json(PhotoResponse {
        success: true,
        photo_id: outcome.photo.id,
        matched_stop: outcome.matched_stop,
        message,
    }))
}

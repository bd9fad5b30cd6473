// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin API for projects and device assignment.

use crate::error::{AppError, Result};
use crate::middleware::auth::generate_api_key;
use crate::models::{Device, Project};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/{id}", get(get_project))
        .route("/api/projects/{id}/api-key", post(regenerate_api_key))
        .route(
            "/api/projects/{id}/devices/{device_id}/assign",
            post(assign_device),
        )
        .route(
            "/api/projects/{id}/devices/{device_id}",
            delete(delete_device),
        )
}

/// Look up a project or fail with 404.
pub(crate) async fn load_project(state: &AppState, project_id: u64) -> Result<Project> {
    state
        .db
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))
}

#[derive(Deserialize)]
struct CreateProjectRequest {
    name: String,
    arrival_threshold_meters: Option<u32>,
}

/// Create a project with a fresh device API key.
async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let api_key = generate_api_key();
    let project = state
        .db
        .create_project(name, &api_key, req.arrival_threshold_meters)
        .await?;

    tracing::info!(project_id = project.id, name = %project.name, "Created project");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Project>>> {
    Ok(Json(state.db.list_projects().await?))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<u64>,
) -> Result<Json<Project>> {
    Ok(Json(load_project(&state, project_id).await?))
}

/// Issue a new device API key; devices holding the old one get 401.
async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<u64>,
) -> Result<Json<Project>> {
    let api_key = generate_api_key();
    let project = state.db.set_project_api_key(project_id, &api_key).await?;

    tracing::info!(project_id, "Regenerated project API key");
    Ok(Json(project))
}

#[derive(Deserialize)]
struct AssignDeviceRequest {
    /// `None` (or empty) unassigns the device
    course_name: Option<String>,
}

/// Assign a device to a course.
async fn assign_device(
    State(state): State<Arc<AppState>>,
    Path((project_id, device_id)): Path<(u64, String)>,
    Json(req): Json<AssignDeviceRequest>,
) -> Result<Json<Device>> {
    load_project(&state, project_id).await?;

    let course_name = req.course_name.filter(|c| !c.is_empty());
    let device = state
        .db
        .assign_device_course(project_id, &device_id, course_name)
        .await?;

    tracing::info!(
        project_id,
        device_id = %device.device_id,
        course = ?device.course_name,
        "Assigned device"
    );
    Ok(Json(device))
}

/// Remove a device registration. Its pings stay with the course.
async fn delete_device(
    State(state): State<Arc<AppState>>,
    Path((project_id, device_id)): Path<(u64, String)>,
) -> Result<StatusCode> {
    load_project(&state, project_id).await?;

    if !state.db.delete_device(project_id, &device_id).await? {
        return Err(AppError::NotFound(format!("Device {} not found", device_id)));
    }

    tracing::info!(project_id, device_id = %device_id, "Deleted device");
    Ok(StatusCode::NO_CONTENT)
}

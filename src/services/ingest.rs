// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-facing operations: registration, ping batches and photo metadata.

use crate::db::Store;
use crate::error::AppError;
use crate::models::{Coordinates, CourseKey, Device, NewPhoto, PhotoMetadata, Ping, Project};
use crate::services::arrival::{self, CourseLocks};
use crate::services::photo_match;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// One ping as submitted by a device.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub latitude: f64,
    pub longitude: f64,
    /// RFC3339
    pub timestamp: String,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub bearing: Option<f64>,
    pub battery_level: Option<u8>,
}

impl LocationInput {
    fn into_ping(self) -> Result<Ping, chrono::ParseError> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        Ok(Ping {
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp,
            accuracy: self.accuracy,
            speed: self.speed,
            bearing: self.bearing,
            battery_level: self.battery_level,
        })
    }
}

/// Photo metadata as submitted by a device.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoInput {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub device_photo_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// RFC3339
    pub taken_at: String,
}

/// Knobs shared by every ingestion call.
#[derive(Debug, Clone, Copy)]
pub struct IngestSettings {
    pub default_threshold_meters: u32,
    pub local_offset: FixedOffset,
}

/// Outcome of recording a ping batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub recorded: usize,
    pub transitions: usize,
}

/// The stop a photo was matched to, as reported back to the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedStop {
    pub id: u64,
    pub sequence: String,
    pub stop_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_meters: f64,
}

/// Outcome of recording photo metadata.
#[derive(Debug, Clone)]
pub struct PhotoOutcome {
    pub photo: PhotoMetadata,
    pub matched_stop: Option<MatchedStop>,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|t| t.with_timezone(&Utc))
}

fn require_device_id(device_id: &str) -> Result<(), AppError> {
    if device_id.is_empty() {
        return Err(AppError::BadRequest("device_id is required".to_string()));
    }
    Ok(())
}

/// Resolve the course a device reports for.
async fn device_course(
    store: &dyn Store,
    project: &Project,
    device_id: &str,
) -> Result<CourseKey, AppError> {
    let device = store
        .get_device(project.id, device_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(
                "Device not found. Register device first using POST /api/v1/devices".to_string(),
            )
        })?;

    let course = device
        .assigned_course()
        .ok_or_else(|| AppError::BadRequest("No course assigned to this device".to_string()))?;

    store.touch_device(project.id, device_id).await?;
    Ok(CourseKey::new(project.id, course))
}

/// Register a device, or return the existing registration.
pub async fn register_device(
    store: &dyn Store,
    project: &Project,
    device_id: &str,
    device_name: Option<String>,
) -> Result<(Device, bool), AppError> {
    require_device_id(device_id)?;
    let (device, created) = store
        .register_device(project.id, device_id, device_name)
        .await?;
    if created {
        tracing::info!(project_id = project.id, device_id, "Registered device");
    }
    Ok((device, created))
}

/// Record a batch of pings and run arrival detection for each, in order.
///
/// Pings with a bad timestamp or a failed write are skipped. The batch as a
/// whole fails only if nothing was recorded.
pub async fn record_locations(
    store: &dyn Store,
    locks: &CourseLocks,
    project: &Project,
    device_id: &str,
    locations: Vec<LocationInput>,
    settings: IngestSettings,
) -> Result<IngestOutcome, AppError> {
    require_device_id(device_id)?;
    if locations.is_empty() {
        return Err(AppError::BadRequest(
            "locations array cannot be empty".to_string(),
        ));
    }

    let course = device_course(store, project, device_id).await?;
    let threshold = project.arrival_threshold(settings.default_threshold_meters);

    let _guard = locks.lock(&course).await;

    let mut outcome = IngestOutcome {
        recorded: 0,
        transitions: 0,
    };
    for input in locations {
        let ping = match input.into_ping() {
            Ok(ping) => ping,
            Err(e) => {
                tracing::warn!(device_id, error = %e, "Skipping ping with invalid timestamp");
                continue;
            }
        };

        if let Err(e) = store
            .append_location(&course, Some(device_id.to_string()), ping.clone())
            .await
        {
            tracing::warn!(device_id, error = %e, "Failed to store ping");
            continue;
        }
        outcome.recorded += 1;

        match arrival::process_ping(store, &course, &ping, threshold, settings.local_offset).await
        {
            Ok(transitions) => outcome.transitions += transitions.len(),
            Err(e) => tracing::warn!(device_id, error = %e, "Arrival check failed"),
        }
    }

    if outcome.recorded == 0 {
        return Err(AppError::BadRequest(
            "No valid locations were recorded".to_string(),
        ));
    }

    tracing::debug!(
        project_id = project.id,
        course = %course.course_name,
        recorded = outcome.recorded,
        transitions = outcome.transitions,
        "Recorded ping batch"
    );
    Ok(outcome)
}

/// Store photo metadata, tagged with the nearest stop in range.
pub async fn record_photo(
    store: &dyn Store,
    project: &Project,
    input: PhotoInput,
    settings: IngestSettings,
) -> Result<PhotoOutcome, AppError> {
    require_device_id(&input.device_id)?;
    if input.device_photo_id.is_empty() {
        return Err(AppError::BadRequest(
            "device_photo_id is required".to_string(),
        ));
    }

    let course = device_course(store, project, &input.device_id).await?;

    let taken_at = parse_timestamp(&input.taken_at).map_err(|_| {
        AppError::BadRequest(
            "Invalid taken_at format. Use RFC3339 format (e.g., 2025-12-02T15:04:05+09:00)"
                .to_string(),
        )
    })?;

    let stops = store.list_stops(&course).await?;
    let threshold = project.arrival_threshold(settings.default_threshold_meters);
    let at = Coordinates::new(input.latitude, input.longitude);

    let matched_stop = photo_match::nearest_stop(at, &stops, threshold).and_then(|m| {
        let c = m.stop.coordinates()?;
        Some(MatchedStop {
            id: m.stop.id,
            sequence: m.stop.record.sequence.clone(),
            stop_name: m.stop.name().to_string(),
            address: m.stop.record.address.clone(),
            latitude: c.latitude,
            longitude: c.longitude,
            distance_meters: m.distance_m,
        })
    });

    let photo = store
        .create_photo(NewPhoto {
            project_id: project.id,
            course_name: course.course_name.clone(),
            device_photo_id: input.device_photo_id,
            latitude: input.latitude,
            longitude: input.longitude,
            taken_at,
            route_stop_id: matched_stop.as_ref().map(|s| s.id),
        })
        .await?;

    tracing::info!(
        project_id = project.id,
        photo_id = photo.id,
        matched_stop = ?photo.photo.route_stop_id,
        "Recorded photo metadata"
    );
    Ok(PhotoOutcome {
        photo,
        matched_stop,
    })
}

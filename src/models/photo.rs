// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Photo metadata model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Photo metadata as submitted by a device, before storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPhoto {
    pub project_id: u64,
    pub course_name: String,
    pub device_photo_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub taken_at: DateTime<Utc>,
    /// Stop matched at creation time; never recomputed
    pub route_stop_id: Option<u64>,
}

/// Stored photo metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub id: u64,
    #[serde(flatten)]
    pub photo: NewPhoto,
    pub created_at: String,
}

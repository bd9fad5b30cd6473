// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Project (logistics case), course and device models.

use serde::{Deserialize, Serialize};

/// A logistics project owning courses, stops and devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    /// Key devices present in `X-Project-Api-Key`
    pub api_key: String,
    /// Geofence radius; `None` falls back to the configured default
    pub arrival_threshold_meters: Option<u32>,
    pub created_at: String,
}

impl Project {
    /// Arrival threshold in meters, falling back to `default_meters`.
    pub fn arrival_threshold(&self, default_meters: u32) -> f64 {
        f64::from(self.arrival_threshold_meters.unwrap_or(default_meters))
    }
}

/// Grouping key for a course's stops and pings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseKey {
    pub project_id: u64,
    pub course_name: String,
}

impl CourseKey {
    pub fn new(project_id: u64, course_name: impl Into<String>) -> Self {
        Self {
            project_id,
            course_name: course_name.into(),
        }
    }
}

/// Course listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub course_name: String,
    pub stop_count: usize,
}

/// A tracking device registered to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub project_id: u64,
    pub device_id: String,
    pub device_name: Option<String>,
    /// Course the device reports pings for
    pub course_name: Option<String>,
    pub registered_at: String,
    pub last_seen_at: Option<String>,
}

impl Device {
    /// Assigned course, treating an empty name as unassigned.
    pub fn assigned_course(&self) -> Option<&str> {
        self.course_name.as_deref().filter(|c| !c.is_empty())
    }
}

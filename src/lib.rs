// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Route-Tracker: live tracking of delivery vehicles along planned courses
//!
//! This crate provides the backend API that turns GPS pings from vehicles
//! into stop arrivals and departures, progress and ETA estimates, and
//! photo-to-stop matching.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::ingest::IngestSettings;
use services::{CourseLocks, RouteProvider};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    /// Directions API, when configured (needed only for trace generation)
    pub directions: Option<Arc<dyn RouteProvider>>,
    /// Serializes arrival evaluation per course
    pub course_locks: CourseLocks,
}

impl AppState {
    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            default_threshold_meters: self.config.default_arrival_threshold_meters,
            local_offset: self.config.local_offset(),
        }
    }
}

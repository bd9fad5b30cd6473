// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer.
//!
//! [`Store`] is the contract the tracking core needs from persistent storage.
//! [`MemoryDb`] is the in-process implementation used by the server and tests.

pub mod memory;

pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{
    CourseKey, CourseSummary, Device, LocationLog, NewPhoto, PhotoMetadata, Ping, Project, Stop,
    StopRecord,
};
use crate::time_utils::ClockTime;
use futures_util::future::BoxFuture;

/// Boxed future returned by every storage operation.
pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, AppError>>;

/// Storage operations used by the tracking core.
///
/// Stops are returned in import order; that order is the course order.
pub trait Store: Send + Sync {
    // ─── Projects ────────────────────────────────────────────────

    fn create_project<'a>(
        &'a self,
        name: &'a str,
        api_key: &'a str,
        arrival_threshold_meters: Option<u32>,
    ) -> StoreFuture<'a, Project>;

    fn get_project(&self, project_id: u64) -> StoreFuture<'_, Option<Project>>;

    fn get_project_by_api_key<'a>(&'a self, api_key: &'a str)
        -> StoreFuture<'a, Option<Project>>;

    /// Every project, oldest first.
    fn list_projects(&self) -> StoreFuture<'_, Vec<Project>>;

    /// Replace the project's API key. The old key stops working immediately.
    fn set_project_api_key<'a>(&'a self, project_id: u64, api_key: &'a str)
        -> StoreFuture<'a, Project>;

    // ─── Stops ───────────────────────────────────────────────────

    /// Stops of one course, in course order.
    fn list_stops<'a>(&'a self, course: &'a CourseKey) -> StoreFuture<'a, Vec<Stop>>;

    fn get_stop(&self, stop_id: u64) -> StoreFuture<'_, Option<Stop>>;

    /// Replace every stop of the project (all courses). Returns the number stored.
    fn replace_stops(&self, project_id: u64, records: Vec<StopRecord>)
        -> StoreFuture<'_, usize>;

    /// Course names with stop counts, in first-seen order.
    fn list_courses(&self, project_id: u64) -> StoreFuture<'_, Vec<CourseSummary>>;

    /// Set `Arrived` with the given arrival time, clearing any departure.
    fn mark_stop_arrived(&self, stop_id: u64, arrived_at: ClockTime) -> StoreFuture<'_, ()>;

    /// Record the departure of an arrived stop.
    fn mark_stop_departed(&self, stop_id: u64, departed_at: ClockTime) -> StoreFuture<'_, ()>;

    fn clear_stop_departure(&self, stop_id: u64) -> StoreFuture<'_, ()>;

    /// Force every stop of the course back to `Unvisited`. Returns the number of stops.
    fn reset_course<'a>(&'a self, course: &'a CourseKey) -> StoreFuture<'a, usize>;

    // ─── Location logs ───────────────────────────────────────────

    /// Most recent ping by timestamp.
    fn latest_location<'a>(&'a self, course: &'a CourseKey)
        -> StoreFuture<'a, Option<LocationLog>>;

    fn append_location<'a>(
        &'a self,
        course: &'a CourseKey,
        device_id: Option<String>,
        ping: Ping,
    ) -> StoreFuture<'a, LocationLog>;

    /// Delete all pings of the course. Returns the number deleted.
    fn delete_locations<'a>(&'a self, course: &'a CourseKey) -> StoreFuture<'a, usize>;

    // ─── Devices ─────────────────────────────────────────────────

    /// Register a device; returns the device and whether it was newly created.
    fn register_device<'a>(
        &'a self,
        project_id: u64,
        device_id: &'a str,
        device_name: Option<String>,
    ) -> StoreFuture<'a, (Device, bool)>;

    fn get_device<'a>(&'a self, project_id: u64, device_id: &'a str)
        -> StoreFuture<'a, Option<Device>>;

    fn assign_device_course<'a>(
        &'a self,
        project_id: u64,
        device_id: &'a str,
        course_name: Option<String>,
    ) -> StoreFuture<'a, Device>;

    /// Remove a device registration. Returns false if it did not exist.
    fn delete_device<'a>(&'a self, project_id: u64, device_id: &'a str) -> StoreFuture<'a, bool>;

    /// Update the device's last-seen timestamp.
    fn touch_device<'a>(&'a self, project_id: u64, device_id: &'a str) -> StoreFuture<'a, ()>;

    // ─── Photos ──────────────────────────────────────────────────

    fn create_photo(&self, photo: NewPhoto) -> StoreFuture<'_, PhotoMetadata>;
}

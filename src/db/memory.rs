// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory [`Store`] backed by concurrent maps.

use crate::db::{Store, StoreFuture};
use crate::error::AppError;
use crate::models::{
    CourseKey, CourseSummary, Device, LocationLog, NewPhoto, PhotoMetadata, Ping, Project, Stop,
    StopRecord, VisitState,
};
use crate::time_utils::{format_utc_rfc3339, ClockTime};
use dashmap::DashMap;
use futures_util::future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory database. Cheap to clone; clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: AtomicU64,
    projects: DashMap<u64, Project>,
    /// Stops per project, in import order
    stops: DashMap<u64, Vec<Stop>>,
    /// stop id -> owning project id
    stop_projects: DashMap<u64, u64>,
    locations: DashMap<CourseKey, Vec<LocationLog>>,
    devices: DashMap<(u64, String), Device>,
    photos: DashMap<u64, PhotoMetadata>,
}

fn done<'a, T: Send + 'a>(result: Result<T, AppError>) -> StoreFuture<'a, T> {
    Box::pin(future::ready(result))
}

fn now() -> String {
    format_utc_rfc3339(chrono::Utc::now())
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        self.tables.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Apply `update` to one stop, located through the stop index.
    fn update_stop(
        &self,
        stop_id: u64,
        update: impl FnOnce(&mut Stop) -> Result<(), AppError>,
    ) -> Result<(), AppError> {
        let not_found = || AppError::NotFound(format!("Stop {} not found", stop_id));

        let project_id = self
            .tables
            .stop_projects
            .get(&stop_id)
            .map(|entry| *entry.value())
            .ok_or_else(not_found)?;

        let mut stops = self.tables.stops.get_mut(&project_id).ok_or_else(not_found)?;
        let stop = stops
            .iter_mut()
            .find(|s| s.id == stop_id)
            .ok_or_else(not_found)?;
        update(stop)
    }

    fn replace_stops_sync(&self, project_id: u64, records: Vec<StopRecord>) -> usize {
        let stops: Vec<Stop> = records
            .into_iter()
            .map(|record| Stop {
                id: self.next_id(),
                project_id,
                record,
                visit: VisitState::Unvisited,
            })
            .collect();
        let count = stops.len();

        for stop in &stops {
            self.tables.stop_projects.insert(stop.id, project_id);
        }
        if let Some(old) = self.tables.stops.insert(project_id, stops) {
            for stop in old {
                self.tables.stop_projects.remove(&stop.id);
            }
        }
        count
    }

    fn list_courses_sync(&self, project_id: u64) -> Vec<CourseSummary> {
        let mut courses: Vec<CourseSummary> = Vec::new();
        if let Some(stops) = self.tables.stops.get(&project_id) {
            for stop in stops.iter() {
                match courses
                    .iter_mut()
                    .find(|c| c.course_name == stop.record.course_name)
                {
                    Some(course) => course.stop_count += 1,
                    None => courses.push(CourseSummary {
                        course_name: stop.record.course_name.clone(),
                        stop_count: 1,
                    }),
                }
            }
        }
        courses
    }

    fn register_device_sync(
        &self,
        project_id: u64,
        device_id: &str,
        device_name: Option<String>,
    ) -> (Device, bool) {
        let key = (project_id, device_id.to_string());
        if let Some(existing) = self.tables.devices.get(&key) {
            return (existing.clone(), false);
        }
        let device = self
            .tables
            .devices
            .entry(key)
            .or_insert_with(|| Device {
                project_id,
                device_id: device_id.to_string(),
                device_name: device_name.filter(|n| !n.is_empty()),
                course_name: None,
                registered_at: now(),
                last_seen_at: None,
            })
            .clone();
        (device, true)
    }
}

impl Store for MemoryDb {
    fn create_project<'a>(
        &'a self,
        name: &'a str,
        api_key: &'a str,
        arrival_threshold_meters: Option<u32>,
    ) -> StoreFuture<'a, Project> {
        let project = Project {
            id: self.next_id(),
            name: name.to_string(),
            api_key: api_key.to_string(),
            arrival_threshold_meters,
            created_at: now(),
        };
        self.tables.projects.insert(project.id, project.clone());
        done(Ok(project))
    }

    fn get_project(&self, project_id: u64) -> StoreFuture<'_, Option<Project>> {
        done(Ok(self
            .tables
            .projects
            .get(&project_id)
            .map(|p| p.value().clone())))
    }

    fn get_project_by_api_key<'a>(
        &'a self,
        api_key: &'a str,
    ) -> StoreFuture<'a, Option<Project>> {
        done(Ok(self
            .tables
            .projects
            .iter()
            .find(|p| p.api_key == api_key)
            .map(|p| p.value().clone())))
    }

    fn list_projects(&self) -> StoreFuture<'_, Vec<Project>> {
        let mut projects: Vec<Project> = self
            .tables
            .projects
            .iter()
            .map(|p| p.value().clone())
            .collect();
        projects.sort_by_key(|p| p.id);
        done(Ok(projects))
    }

    fn set_project_api_key<'a>(
        &'a self,
        project_id: u64,
        api_key: &'a str,
    ) -> StoreFuture<'a, Project> {
        let result = match self.tables.projects.get_mut(&project_id) {
            Some(mut project) => {
                project.api_key = api_key.to_string();
                Ok(project.clone())
            }
            None => Err(AppError::NotFound(format!("Project {} not found", project_id))),
        };
        done(result)
    }

    fn list_stops<'a>(&'a self, course: &'a CourseKey) -> StoreFuture<'a, Vec<Stop>> {
        let stops = self
            .tables
            .stops
            .get(&course.project_id)
            .map(|stops| {
                stops
                    .iter()
                    .filter(|s| s.record.course_name == course.course_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        done(Ok(stops))
    }

    fn get_stop(&self, stop_id: u64) -> StoreFuture<'_, Option<Stop>> {
        let stop = self
            .tables
            .stop_projects
            .get(&stop_id)
            .map(|entry| *entry.value())
            .and_then(|project_id| {
                self.tables
                    .stops
                    .get(&project_id)
                    .and_then(|stops| stops.iter().find(|s| s.id == stop_id).cloned())
            });
        done(Ok(stop))
    }

    fn replace_stops(
        &self,
        project_id: u64,
        records: Vec<StopRecord>,
    ) -> StoreFuture<'_, usize> {
        done(Ok(self.replace_stops_sync(project_id, records)))
    }

    fn list_courses(&self, project_id: u64) -> StoreFuture<'_, Vec<CourseSummary>> {
        done(Ok(self.list_courses_sync(project_id)))
    }

    fn mark_stop_arrived(&self, stop_id: u64, arrived_at: ClockTime) -> StoreFuture<'_, ()> {
        done(self.update_stop(stop_id, |stop| {
            stop.visit = VisitState::Arrived {
                arrived_at,
                departed_at: None,
            };
            Ok(())
        }))
    }

    fn mark_stop_departed(&self, stop_id: u64, departed_at: ClockTime) -> StoreFuture<'_, ()> {
        done(self.update_stop(stop_id, |stop| match &mut stop.visit {
            VisitState::Arrived {
                departed_at: slot, ..
            } => {
                *slot = Some(departed_at);
                Ok(())
            }
            VisitState::Unvisited => Err(AppError::Database(format!(
                "Stop {} cannot depart before arriving",
                stop_id
            ))),
        }))
    }

    fn clear_stop_departure(&self, stop_id: u64) -> StoreFuture<'_, ()> {
        done(self.update_stop(stop_id, |stop| {
            if let VisitState::Arrived { departed_at, .. } = &mut stop.visit {
                *departed_at = None;
            }
            Ok(())
        }))
    }

    fn reset_course<'a>(&'a self, course: &'a CourseKey) -> StoreFuture<'a, usize> {
        let mut count = 0;
        if let Some(mut stops) = self.tables.stops.get_mut(&course.project_id) {
            for stop in stops
                .iter_mut()
                .filter(|s| s.record.course_name == course.course_name)
            {
                stop.visit = VisitState::Unvisited;
                count += 1;
            }
        }
        done(Ok(count))
    }

    fn latest_location<'a>(
        &'a self,
        course: &'a CourseKey,
    ) -> StoreFuture<'a, Option<LocationLog>> {
        let latest = self.tables.locations.get(course).and_then(|logs| {
            logs.iter()
                .max_by_key(|log| log.ping.timestamp)
                .cloned()
        });
        done(Ok(latest))
    }

    fn append_location<'a>(
        &'a self,
        course: &'a CourseKey,
        device_id: Option<String>,
        ping: Ping,
    ) -> StoreFuture<'a, LocationLog> {
        let log = LocationLog {
            id: self.next_id(),
            project_id: course.project_id,
            course_name: course.course_name.clone(),
            device_id,
            ping,
        };
        self.tables
            .locations
            .entry(course.clone())
            .or_default()
            .push(log.clone());
        done(Ok(log))
    }

    fn delete_locations<'a>(&'a self, course: &'a CourseKey) -> StoreFuture<'a, usize> {
        let deleted = self
            .tables
            .locations
            .remove(course)
            .map(|(_, logs)| logs.len())
            .unwrap_or(0);
        done(Ok(deleted))
    }

    fn register_device<'a>(
        &'a self,
        project_id: u64,
        device_id: &'a str,
        device_name: Option<String>,
    ) -> StoreFuture<'a, (Device, bool)> {
        done(Ok(self.register_device_sync(project_id, device_id, device_name)))
    }

    fn get_device<'a>(
        &'a self,
        project_id: u64,
        device_id: &'a str,
    ) -> StoreFuture<'a, Option<Device>> {
        done(Ok(self
            .tables
            .devices
            .get(&(project_id, device_id.to_string()))
            .map(|d| d.value().clone())))
    }

    fn assign_device_course<'a>(
        &'a self,
        project_id: u64,
        device_id: &'a str,
        course_name: Option<String>,
    ) -> StoreFuture<'a, Device> {
        let result = match self
            .tables
            .devices
            .get_mut(&(project_id, device_id.to_string()))
        {
            Some(mut device) => {
                device.course_name = course_name;
                Ok(device.clone())
            }
            None => Err(AppError::NotFound(format!("Device {} not found", device_id))),
        };
        done(result)
    }

    fn delete_device<'a>(&'a self, project_id: u64, device_id: &'a str) -> StoreFuture<'a, bool> {
        done(Ok(self
            .tables
            .devices
            .remove(&(project_id, device_id.to_string()))
            .is_some()))
    }

    fn touch_device<'a>(&'a self, project_id: u64, device_id: &'a str) -> StoreFuture<'a, ()> {
        if let Some(mut device) = self
            .tables
            .devices
            .get_mut(&(project_id, device_id.to_string()))
        {
            device.last_seen_at = Some(now());
        }
        done(Ok(()))
    }

    fn create_photo(&self, photo: NewPhoto) -> StoreFuture<'_, PhotoMetadata> {
        let stored = PhotoMetadata {
            id: self.next_id(),
            photo,
            created_at: now(),
        };
        self.tables.photos.insert(stored.id, stored.clone());
        done(Ok(stored))
    }
}

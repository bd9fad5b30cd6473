// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use axum::response::Response;
use futures_util::future::BoxFuture;
use route_tracker::config::Config;
use route_tracker::db::MemoryDb;
use route_tracker::error::AppError;
use route_tracker::middleware::auth::API_KEY_HEADER;
use route_tracker::models::{Coordinates, Project, Stop, StopRecord};
use route_tracker::routes::create_router;
use route_tracker::services::geodesy;
use route_tracker::services::{CourseLocks, RoutePath, RouteProvider};
use route_tracker::AppState;
use serde_json::Value;
use std::sync::Arc;

/// Directions stand-in: a straight two-point path between the endpoints.
pub struct StraightLineRoutes;

impl RouteProvider for StraightLineRoutes {
    fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> BoxFuture<'_, Result<RoutePath, AppError>> {
        Box::pin(async move {
            Ok(RoutePath {
                points: vec![origin, destination],
                distance_meters: geodesy::distance_m(origin, destination) as u64,
                duration_secs: 600,
            })
        })
    }
}

/// Directions stand-in that finds no route anywhere.
pub struct NoRoutes;

impl RouteProvider for NoRoutes {
    fn route(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
    ) -> BoxFuture<'_, Result<RoutePath, AppError>> {
        Box::pin(async { Err(AppError::Routing("ZERO_RESULTS".to_string())) })
    }
}

/// Create a test app backed by an in-memory store and fake directions.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Some(Arc::new(StraightLineRoutes)))
}

/// Create a test app with no directions provider configured.
#[allow(dead_code)]
pub fn create_test_app_without_directions() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(None)
}

/// Create a test app with the given directions provider.
#[allow(dead_code)]
pub fn create_test_app_with(
    directions: Option<Arc<dyn RouteProvider>>,
) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        db: Arc::new(MemoryDb::new()),
        directions,
        course_locks: CourseLocks::new(),
    });

    (create_router(state.clone()), state)
}

/// Create a project directly in the store.
#[allow(dead_code)]
pub async fn create_project(state: &AppState, threshold_meters: Option<u32>) -> Project {
    state
        .db
        .create_project("Test Project", "test-project-key", threshold_meters)
        .await
        .expect("Failed to create project")
}

/// A stop row for course `course`.
#[allow(dead_code)]
pub fn stop_record(course: &str, sequence: &str, time: &str, lat: f64, lng: f64) -> StopRecord {
    StopRecord {
        course_name: course.to_string(),
        sequence: sequence.to_string(),
        scheduled_arrival: Some(time.to_string()),
        stop_name: format!("Stop {}", sequence),
        coordinates: Some(Coordinates::new(lat, lng)),
        ..Default::default()
    }
}

/// Store `records` and return the stops of `course` in course order.
#[allow(dead_code)]
pub async fn seed_course(
    state: &AppState,
    project_id: u64,
    course: &str,
    records: Vec<StopRecord>,
) -> Vec<Stop> {
    state
        .db
        .replace_stops(project_id, records)
        .await
        .expect("Failed to store stops");
    state
        .db
        .list_stops(&route_tracker::models::CourseKey::new(project_id, course))
        .await
        .expect("Failed to list stops")
}

/// Register `device_id` and assign it to `course`.
#[allow(dead_code)]
pub async fn register_device(state: &AppState, project_id: u64, device_id: &str, course: &str) {
    state
        .db
        .register_device(project_id, device_id, None)
        .await
        .expect("Failed to register device");
    state
        .db
        .assign_device_course(project_id, device_id, Some(course.to_string()))
        .await
        .expect("Failed to assign device");
}

/// A JSON request authenticated with a project API key.
#[allow(dead_code)]
pub fn device_request(uri: &str, api_key: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(API_KEY_HEADER, api_key)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// An admin request with the test bearer token.
#[allow(dead_code)]
pub fn admin_request(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, "Bearer test_admin_token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication tests for the device and admin APIs.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_health_needs_no_auth() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_device_api_requires_api_key() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/devices")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"device_id": "phone-1"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_device_api_rejects_unknown_api_key() {
    let (app, state) = common::create_test_app();
    common::create_project(&state, None).await;

    let response = app
        .oneshot(common::device_request(
            "/api/v1/devices",
            "not-the-key",
            json!({"device_id": "phone-1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_device_api_accepts_valid_api_key() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let response = app
        .oneshot(common::device_request(
            "/api/v1/devices",
            &project.api_key,
            json!({"device_id": "phone-1", "device_name": "Truck 1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["device_id"], "phone-1");
    assert!(body["course_name"].is_null());
}

#[tokio::test]
async fn test_admin_api_requires_bearer_token() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/projects/{}", project.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_api_rejects_wrong_token() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/projects/{}", project.id))
                .header(header::AUTHORIZATION, "Bearer wrong_token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_api_does_not_accept_project_key() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/projects/{}", project.id))
                .header(header::AUTHORIZATION, format!("Bearer {}", project.api_key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_project_returns_api_key() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(common::admin_request(
            "POST",
            "/api/projects",
            Body::from(json!({"name": "Tokyo run", "arrival_threshold_meters": 80}).to_string()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["name"], "Tokyo run");
    assert_eq!(body["arrival_threshold_meters"], 80);
    assert_eq!(body["api_key"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn test_create_project_requires_name() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(common::admin_request(
            "POST",
            "/api/projects",
            Body::from(json!({"name": "   "}).to_string()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(common::admin_request(
            "GET",
            "/api/projects/999",
            Body::empty(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_regenerated_api_key_replaces_old_key() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let response = app
        .clone()
        .oneshot(common::admin_request(
            "POST",
            &format!("/api/projects/{}/api-key", project.id),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let new_key = body["api_key"].as_str().unwrap().to_string();
    assert_ne!(new_key, project.api_key);
    assert_eq!(new_key.len(), 32);

    let response = app
        .clone()
        .oneshot(common::device_request(
            "/api/v1/devices",
            &project.api_key,
            json!({"device_id": "phone-1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(common::device_request(
            "/api/v1/devices",
            &new_key,
            json!({"device_id": "phone-1"}),
        ))
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_regenerate_api_key_unknown_project() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(common::admin_request(
            "POST",
            "/api/projects/999/api-key",
            Body::empty(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_projects() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let response = app
        .oneshot(common::admin_request("GET", "/api/projects", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let projects = body.as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["id"], project.id);
}

#[tokio::test]
async fn test_deleted_device_cannot_upload() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;
    common::register_device(&state, project.id, "phone-1", "A").await;

    let delete = || {
        common::admin_request(
            "DELETE",
            &format!("/api/projects/{}/devices/phone-1", project.id),
            Body::empty(),
        )
    };

    let response = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(common::device_request(
            "/api/v1/locations",
            &project.api_key,
            json!({
                "device_id": "phone-1",
                "locations": [{
                    "latitude": 35.0,
                    "longitude": 139.0,
                    "timestamp": "2025-12-02T00:00:00Z",
                }],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

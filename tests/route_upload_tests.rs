// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route sheet upload and course listing.

use axum::{body::Body, http::StatusCode};
use tower::ServiceExt;

mod common;

const HEADER: &str = "コース,順番,到着予定,名称,住所,緯度,経度,滞在,重量,状態,-,電話,備考1,備考2,備考3,希望開始,希望終了";

/// A full 17-column row.
fn row(course: &str, sequence: &str, time: &str, name: &str, lat: f64, lng: f64) -> String {
    format!(
        "{course},{sequence},{time},{name},東京都千代田区,{lat},{lng},10,5,,,03-0000-0000,,,,,"
    )
}

fn sheet(rows: &[String], header: bool) -> Vec<u8> {
    let mut text = String::new();
    if header {
        text.push_str(HEADER);
        text.push('\n');
    }
    for r in rows {
        text.push_str(r);
        text.push('\n');
    }
    let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(&text);
    assert!(!had_errors);
    bytes.into_owned()
}

fn upload(project_id: u64, query: &str, body: Vec<u8>) -> axum::http::Request<Body> {
    common::admin_request(
        "POST",
        &format!("/api/projects/{}/courses/upload{}", project_id, query),
        Body::from(body),
    )
}

#[tokio::test]
async fn test_upload_replaces_stops_and_groups_courses() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let body = sheet(
        &[
            row("A", "出発", "08:30", "倉庫", 35.0, 139.0),
            row("A", "1", "09:00", "山田商店", 35.01, 139.0),
            row("B", "1", "10:00", "佐藤工業", 35.02, 139.0),
            // 16 columns: dropped
            "B,2,10:30,short,addr,35.03,139.0,10,5,,,tel,,,,".to_string(),
        ],
        true,
    );

    let response = app
        .clone()
        .oneshot(upload(project.id, "?has_header=true", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["imported"], 3);
    assert_eq!(body["courses"][0]["course_name"], "A");
    assert_eq!(body["courses"][0]["stop_count"], 2);
    assert_eq!(body["courses"][1]["course_name"], "B");
    assert_eq!(body["courses"][1]["stop_count"], 1);

    let response = app
        .oneshot(common::admin_request(
            "GET",
            &format!("/api/projects/{}/courses/A", project.id),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let stops = body["stops"].as_array().unwrap();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0]["sequence"], "出発");
    assert_eq!(stops[1]["stop_name"], "山田商店");
    assert_eq!(stops[1]["stay_minutes"], 10);
    assert_eq!(stops[1]["status"], "unvisited");
}

#[tokio::test]
async fn test_upload_skip_departure_and_shift_start() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let body = sheet(
        &[
            row("A", "出発", "08:30", "倉庫", 35.0, 139.0),
            row("A", "1", "09:00", "一番目", 35.01, 139.0),
            row("A", "2", "09:45", "二番目", 35.02, 139.0),
        ],
        false,
    );

    let response = app
        .clone()
        .oneshot(upload(
            project.id,
            "?skip_departure=true&start_time=23:30",
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["imported"], 2);

    let response = app
        .oneshot(common::admin_request(
            "GET",
            &format!("/api/projects/{}/courses/A", project.id),
            Body::empty(),
        ))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    let stops = body["stops"].as_array().unwrap();
    assert_eq!(stops[0]["scheduled_arrival"], "23:30");
    assert_eq!(stops[1]["scheduled_arrival"], "00:15");
}

#[tokio::test]
async fn test_upload_rejects_bad_start_time() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    for start_time in ["noon", "99999999:00", "-1:00"] {
        let body = sheet(&[row("A", "1", "09:00", "x", 35.0, 139.0)], false);
        let response = app
            .clone()
            .oneshot(upload(project.id, &format!("?start_time={}", start_time), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{start_time}");
    }
}

#[tokio::test]
async fn test_upload_with_out_of_range_sheet_time() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let body = sheet(
        &[
            row("A", "1", "99999999:00", "x", 35.0, 139.0),
            row("A", "2", "09:30", "y", 35.01, 139.0),
        ],
        false,
    );
    let response = app
        .oneshot(upload(project.id, "?start_time=08:00", body))
        .await
        .unwrap();

    // The course start does not parse, so nothing is shifted
    assert_eq!(response.status(), StatusCode::OK);
    let stops = state
        .db
        .list_stops(&route_tracker::models::CourseKey::new(project.id, "A"))
        .await
        .unwrap();
    assert_eq!(stops[1].record.scheduled_arrival.as_deref(), Some("09:30"));
}

#[tokio::test]
async fn test_upload_empty_sheet() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let response = app
        .clone()
        .oneshot(upload(project.id, "?has_header=true", sheet(&[], true)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Only a departure row, which is then filtered out
    let body = sheet(&[row("A", "出発", "08:30", "倉庫", 35.0, 139.0)], false);
    let response = app
        .oneshot(upload(project.id, "?skip_departure=true", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["details"], "No rows left after filtering");
}

#[tokio::test]
async fn test_unknown_course_is_not_found() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let response = app
        .oneshot(common::admin_request(
            "GET",
            &format!("/api/projects/{}/courses/Z", project.id),
            Body::empty(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_without_coordinates() {
    let (app, state) = common::create_test_app();
    let project = common::create_project(&state, None).await;

    let body = sheet(&[row("A", "1", "09:00", "no-geo", 0.0, 139.0)], false);
    let response = app
        .clone()
        .oneshot(upload(project.id, "", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(common::admin_request(
            "GET",
            &format!("/api/projects/{}/courses/A", project.id),
            Body::empty(),
        ))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert!(body["stops"][0]["coordinates"].is_null());
}

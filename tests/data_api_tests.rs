// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, medical history, health stats, reports and activity history.

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, json_request, token_for};

async fn get_json(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request("GET", uri, Some(token), None))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_profile_update_round_trip() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/me",
            Some(&token),
            Some(json!({ "display_name": "Ada L.", "metadata": { "age": 36 } })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, me) = get_json(&app, "/api/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["display_name"], "Ada L.");
    assert_eq!(me["metadata"]["age"], 36);
}

#[tokio::test]
async fn test_profile_rejects_bad_avatar_url() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/me",
            Some(&token),
            Some(json!({ "avatar_url": "not a url" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_medical_history_add_list_delete() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/medical-history",
            Some(&token),
            Some(json!({ "condition": "Asthma", "diagnosis_date": "2019-04-02" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    let id = item["id"].as_str().unwrap().to_string();

    let (_, items) = get_json(&app, "/api/medical-history", &token).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["condition"], "Asthma");
    assert_eq!(items[0]["diagnosis_date"], "2019-04-02");

    // Not visible to another user
    let other = token_for(&state, "user-2");
    let (_, items) = get_json(&app, "/api/medical-history", &other).await;
    assert_eq!(items, json!([]));

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/medical-history/{}", id),
            Some(&other),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/medical-history/{}", id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, items) = get_json(&app, "/api/medical-history", &token).await;
    assert_eq!(items, json!([]));
}

#[tokio::test]
async fn test_medical_history_requires_condition() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/medical-history",
            Some(&token),
            Some(json!({ "condition": "", "diagnosis_date": "2020-01-01" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_stats_partial_updates() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let (status, stats) = get_json(&app, "/api/health-stats", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, Value::Null);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/health-stats",
            Some(&token),
            Some(json!({ "blood_pressure": "120/80", "heart_rate": 72 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/health-stats",
            Some(&token),
            Some(json!({ "weight": 68.5 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, stats) = get_json(&app, "/api/health-stats", &token).await;
    assert_eq!(stats["blood_pressure"], "120/80");
    assert_eq!(stats["heart_rate"], 72);
    assert_eq!(stats["weight"], 68.5);
    assert_eq!(stats["last_checkup"], Value::Null);
}

#[tokio::test]
async fn test_health_stats_out_of_range_rejected() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/health-stats",
            Some(&token),
            Some(json!({ "heart_rate": 900 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reports_fall_back_to_samples_and_filter() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let (status, reports) = get_json(&app, "/api/reports", &token).await;
    assert_eq!(status, StatusCode::OK);
    let reports = reports.as_array().unwrap();
    assert!(!reports.is_empty());
    assert!(reports.iter().all(|r| r["user_id"].is_null()));

    let (_, lab) = get_json(&app, "/api/reports?type=laboratory", &token).await;
    assert!(lab
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["type"] == "Laboratory"));

    let (_, found) = get_json(&app, "/api/reports?q=VITAMIN", &token).await;
    assert_eq!(found[0]["id"], "rep-002");

    let (status, report) = get_json(&app, "/api/reports/rep-001", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["title"], "Annual Physical Examination");
}

#[tokio::test]
async fn test_report_limit_applies_after_filter() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let (status, imaging) = get_json(&app, "/api/reports?type=Imaging&limit=1", &token).await;
    assert_eq!(status, StatusCode::OK);
    let imaging = imaging.as_array().unwrap();
    assert_eq!(imaging.len(), 1);
    assert_eq!(imaging[0]["type"], "Imaging");

    let (_, first) = get_json(&app, "/api/reports?limit=1", &token).await;
    assert_eq!(first.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_created_report_replaces_samples() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reports",
            Some(&token),
            Some(json!({ "title": "Allergy Panel", "type": "Laboratory" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let report = body_json(response).await;
    assert_eq!(report["doctor"], "Dr. AI Assistant");
    assert_eq!(report["status"], "completed");
    let id = report["id"].as_str().unwrap().to_string();

    let (_, reports) = get_json(&app, "/api/reports", &token).await;
    assert_eq!(reports.as_array().unwrap().len(), 1);
    assert_eq!(reports[0]["title"], "Allergy Panel");

    let other = token_for(&state, "user-2");
    let (status, _) = get_json(&app, &format!("/api/reports/{}", id), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_report() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reports/rep-001/share",
            Some(&token),
            Some(json!({ "email": "doctor@example.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reports/rep-001/share",
            Some(&token),
            Some(json!({ "email": "nope" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/reports/missing/share",
            Some(&token),
            Some(json!({ "email": "doctor@example.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_is_recorded_in_activities() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/chat",
            Some(&token),
            Some(json!({ "message": "I have a cough" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The activity is written in the background
    let mut activities = Value::Null;
    for _ in 0..50 {
        let (_, list) = get_json(&app, "/api/activities?type=chat", &token).await;
        if list.as_array().is_some_and(|a| !a.is_empty()) {
            activities = list;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(activities[0]["title"], "AI Chat Session");
    assert_eq!(activities[0]["description"], "I have a cough");
    assert_eq!(activities[0]["type"], "chat");
    assert_eq!(activities[0]["status"], "completed");
}

#[tokio::test]
async fn test_unknown_activity_type_rejected() {
    let (app, state) = create_test_app();
    let token = token_for(&state, "user-1");

    let (status, body) = get_json(&app, "/api/activities?type=billing", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "unknown activity type: billing");
}

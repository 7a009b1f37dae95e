mod helpers;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use helpers::app::{delete_json, get_json, make_test_app, patch_json, post_json};
use serde_json::{Value, json};

fn event(machine_id: &str, kind: &str, at: DateTime<Utc>) -> Value {
    json!({
        "machineId": machine_id,
        "clientInstanceId": format!("uuid-{machine_id}"),
        "type": kind,
        "timestamp": at.to_rfc3339(),
    })
}

async fn first_session_id(app: &axum::Router, uri: &str) -> i64 {
    let (status, body) = get_json(app, uri).await;
    assert_eq!(status, StatusCode::OK);
    body["data"][0]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn list_filters_by_machine_and_status() {
    let (app, _state) = make_test_app().await;
    let t0 = Utc::now() - Duration::seconds(120);

    post_json(&app, "/api/events", &event("pc-01", "start", t0)).await;
    post_json(&app, "/api/events", &event("pc-02", "start", t0)).await;
    post_json(
        &app,
        "/api/events",
        &event("pc-01", "stop", t0 + Duration::seconds(60)),
    )
    .await;

    let (_, body) = get_json(&app, "/api/sessions?machineId=pc-01").await;
    let sessions = body["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["machineId"], "pc-01");

    let (_, body) = get_json(&app, "/api/sessions?status=UNPAID").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = get_json(&app, "/api/sessions?status=PAID").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _) = get_json(&app, "/api/sessions?status=REFUNDED").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn list_filters_by_user_and_date_range() {
    let (app, _state) = make_test_app().await;
    let t0 = Utc::now() - Duration::seconds(60);

    post_json(&app, "/api/events", &event("pc-01", "start", t0)).await;
    let id = first_session_id(&app, "/api/sessions").await;
    patch_json(
        &app,
        &format!("/api/sessions/{id}"),
        &json!({ "userName": "alice" }),
    )
    .await;

    let (_, body) = get_json(&app, "/api/sessions?user=ali").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = get_json(&app, "/api/sessions?user=bob").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let today = Utc::now().date_naive();
    let (_, body) = get_json(
        &app,
        &format!("/api/sessions?dateFrom={today}&dateTo={today}"),
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let past = today - Duration::days(7);
    let (_, body) = get_json(&app, &format!("/api/sessions?dateTo={past}")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn patch_touches_only_the_provided_fields() {
    let (app, _state) = make_test_app().await;
    post_json(
        &app,
        "/api/events",
        &event("pc-01", "start", Utc::now() - Duration::seconds(30)),
    )
    .await;
    let id = first_session_id(&app, "/api/sessions").await;

    let (status, body) = patch_json(
        &app,
        &format!("/api/sessions/{id}"),
        &json!({ "userName": "alice", "amountDue": 12.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userName"], "alice");
    assert_eq!(body["data"]["amountDue"], 12.5);
    assert!(body["data"]["notes"].is_null());
    assert_eq!(body["data"]["paidStatus"], "UNPAID");

    let (status, body) = patch_json(
        &app,
        &format!("/api/sessions/{id}"),
        &json!({ "paidStatus": "PAID", "amountPaid": 12.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["paidStatus"], "PAID");
    // Earlier fields survive the second patch.
    assert_eq!(body["data"]["userName"], "alice");
}

#[tokio::test]
async fn patch_unknown_session_is_not_found() {
    let (app, _state) = make_test_app().await;
    let (status, body) = patch_json(
        &app,
        "/api/sessions/9999",
        &json!({ "userName": "ghost" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn explicit_close_then_double_close_conflicts() {
    let (app, _state) = make_test_app().await;
    post_json(
        &app,
        "/api/events",
        &event("pc-01", "start", Utc::now() - Duration::seconds(30)),
    )
    .await;
    let id = first_session_id(&app, "/api/sessions").await;

    let (status, body) = post_json(
        &app,
        &format!("/api/sessions/{id}/close"),
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"]["endAt"].is_null());
    assert!(body["data"]["durationSeconds"].as_i64().unwrap() >= 0);

    let (status, body) = post_json(
        &app,
        &format!("/api/sessions/{id}/close"),
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn close_unknown_session_is_not_found() {
    let (app, _state) = make_test_app().await;
    let (status, _) = post_json(&app, "/api/sessions/42/close", &json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_reset_wipes_machines_and_sessions() {
    let (app, _state) = make_test_app().await;
    let t0 = Utc::now() - Duration::seconds(60);

    post_json(&app, "/api/events", &event("pc-01", "start", t0)).await;
    post_json(&app, "/api/events", &event("pc-02", "start", t0)).await;

    let (status, body) = delete_json(&app, "/api/admin/reset").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"]["machines"], 2);
    assert_eq!(body["data"]["deleted"]["sessions"], 2);

    let (_, body) = get_json(&app, "/api/machines").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    let (_, body) = get_json(&app, "/api/sessions").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

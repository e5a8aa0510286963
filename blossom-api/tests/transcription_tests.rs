//! Integration tests for POST /api/transcriptions and transcription search
//!
//! Validation messages are part of the bots' contract and are asserted verbatim.

mod helpers;

use axum::http::StatusCode;
use blossom_common::db::transcriptions::{find_by_transcription_id, list_for_submission};
use helpers::TestApp;
use serde_json::{json, Value};

/// A complete, valid request body; tests remove or replace keys
fn valid_body(submission_id: Value, v_id: Value) -> Value {
    json!({
        "submission_id": submission_id,
        "v_id": v_id,
        "t_id": "ABC",
        "completion_method": "automated tests",
        "t_url": "https://example.com",
        "t_text": "test content",
    })
}

fn without(mut body: Value, key: &str) -> Value {
    body.as_object_mut().unwrap().remove(key);
    body
}

#[tokio::test]
async fn test_transcription_create() {
    let app = TestApp::new().await;
    let submission = app.submission("AAA").await;

    let body = valid_body(json!("AAA"), json!(app.staff.id));
    let (status, result) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        result["success"],
        "Transcription ID 1 created on post AAA, written by janeeyre"
    );

    let stored = find_by_transcription_id(&app.db, "ABC").await.unwrap().unwrap();
    assert_eq!(stored.submission_id, submission.id);
    assert_eq!(stored.author_id, app.staff.id);
    assert_eq!(stored.completion_method, "automated tests");
    assert_eq!(stored.url.as_deref(), Some("https://example.com"));
    assert_eq!(stored.text.as_deref(), Some("test content"));
}

#[tokio::test]
async fn test_transcription_create_by_internal_id_and_username() {
    let app = TestApp::new().await;
    let submission = app.submission("AAA").await;

    let body = valid_body(json!(submission.id), json!("janeeyre"));
    let (status, result) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        result["success"],
        "Transcription ID 1 created on post AAA, written by janeeyre"
    );
}

#[tokio::test]
async fn test_transcription_numeric_string_falls_back_to_internal_id() {
    let app = TestApp::new().await;
    let submission = app.submission("AAA").await;

    let body = valid_body(json!(submission.id.to_string()), json!(app.staff.id));
    let (status, _) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_transcription_no_submission_id() {
    let app = TestApp::new().await;
    app.submission("AAA").await;

    let body = without(valid_body(json!("AAA"), json!(app.staff.id)), "submission_id");
    let (status, result) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        result["error"],
        "Missing JSON body key `submission_id`, str; the ID of the post the transcription is on."
    );
}

#[tokio::test]
async fn test_transcription_with_invalid_submission_id() {
    let app = TestApp::new().await;
    app.submission("AAA").await;

    let body = valid_body(json!(999), json!(app.staff.id));
    let (status, result) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(result["error"], "No post found with ID 999!");
}

#[tokio::test]
async fn test_transcription_with_invalid_volunteer_id() {
    let app = TestApp::new().await;
    app.submission("AAA").await;

    let body = valid_body(json!("AAA"), json!(999));
    let (status, result) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(result["error"], "No volunteer found with that ID / username.");

    let body = without(valid_body(json!("AAA"), json!(1)), "v_id");
    let (status, _) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transcription_missing_keys_in_order() {
    let app = TestApp::new().await;
    app.submission("AAA").await;
    let full = valid_body(json!("AAA"), json!(app.staff.id));

    let cases = [
        ("t_id", "Missing JSON body key `t_id`, str; the ID of the transcription."),
        (
            "completion_method",
            "Missing JSON body key `completion_method`, str; the service this transcription \
             was completed through. `app`, `ToR`, etc. 20char max.",
        ),
        (
            "t_url",
            "Missing JSON body key `t_url`, str; the direct URL for the transcription. \
             Use string `None` if no URL is available.",
        ),
        ("t_text", "Missing JSON body key `t_text`, str; the content of the transcription."),
    ];

    for (key, message) in cases {
        let (status, result) = app
            .send("POST", "/api/transcriptions", Some(without(full.clone(), key)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {}", key);
        assert_eq!(result["error"], message);
    }

    // The first missing key wins
    let body = without(without(full, "t_text"), "t_id");
    let (_, result) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(
        result["error"],
        "Missing JSON body key `t_id`, str; the ID of the transcription."
    );
}

#[tokio::test]
async fn test_transcription_completion_method_too_long() {
    let app = TestApp::new().await;
    app.submission("AAA").await;

    let mut body = valid_body(json!("AAA"), json!(app.staff.id));
    body["completion_method"] = json!("a".repeat(21));
    let (status, result) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        result["error"],
        "`completion_method` must be 20 characters or fewer."
    );
}

#[tokio::test]
async fn test_transcription_url_none_stores_no_url() {
    let app = TestApp::new().await;
    app.submission("AAA").await;

    let mut body = valid_body(json!("AAA"), json!(app.staff.id));
    body["t_url"] = json!("None");
    let (status, _) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    let stored = find_by_transcription_id(&app.db, "ABC").await.unwrap().unwrap();
    assert!(stored.url.is_none());
}

#[tokio::test]
async fn test_transcription_existing_id_is_idempotent() {
    let app = TestApp::new().await;
    let submission = app.submission("AAA").await;
    let body = valid_body(json!("AAA"), json!(app.staff.id));

    app.send("POST", "/api/transcriptions", Some(body.clone())).await;
    let (status, result) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        result["success"],
        "Transcription ID 1 already exists on post AAA, written by janeeyre"
    );
    assert_eq!(list_for_submission(&app.db, submission.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_second_real_transcription_conflicts() {
    let app = TestApp::new().await;
    app.submission("AAA").await;

    let first = valid_body(json!("AAA"), json!(app.staff.id));
    app.send("POST", "/api/transcriptions", Some(first)).await;

    let mut second = valid_body(json!("AAA"), json!(app.staff.id));
    second["t_id"] = json!("DEF");
    let (status, _) = app.send("POST", "/api/transcriptions", Some(second)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_app_transcription_text_is_sanitised() {
    let app = TestApp::new().await;
    app.submission("AAA").await;

    let mut body = valid_body(json!("AAA"), json!(app.staff.id));
    body["completion_method"] = json!("app");
    body["t_text"] = json!("u/someone posted https://example.com/x. *nice*");
    let (status, _) = app.send("POST", "/api/transcriptions", Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    let stored = find_by_transcription_id(&app.db, "ABC").await.unwrap().unwrap();
    assert_eq!(
        stored.text.as_deref(),
        Some("\\/u/someone posted <redacted link>. *nice*")
    );
}

#[tokio::test]
async fn test_invalid_json_body() {
    let app = TestApp::new().await;
    let request = helpers::authed_request("POST", "/api/transcriptions", &app.api_key, None);
    let (status, result) = helpers::send(app.router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(result["error"].is_string());
}

#[tokio::test]
async fn test_search_by_original_id() {
    let app = TestApp::new().await;
    app.submission("AAA").await;
    app.send(
        "POST",
        "/api/transcriptions",
        Some(valid_body(json!("AAA"), json!(app.staff.id))),
    )
    .await;

    let (status, result) = app
        .send("GET", "/api/transcriptions/search?original_id=AAA", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let list = result.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["transcription_id"], "ABC");

    let (status, _) = app.send("GET", "/api/transcriptions/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("GET", "/api/transcriptions/search?original_id=ZZZ", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

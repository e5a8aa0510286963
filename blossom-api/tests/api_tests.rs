//! Integration tests for blossom-api endpoints
//!
//! Tests cover:
//! - Health and ping (no auth required)
//! - API key authentication
//! - Volunteer create-or-get, summary, gamma, CoC and blacklist
//! - Submission create-or-get, listing and the claim/unclaim/done workflow

mod helpers;

use axum::http::StatusCode;
use blossom_common::db::api_keys::issue_api_key;
use blossom_common::db::transcriptions::insert_transcription;
use blossom_common::db::users::set_blacklisted;
use blossom_common::db::NewTranscription;
use helpers::{anonymous_request, authed_request, send, TestApp};
use serde_json::json;

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = TestApp::new().await;

    let (status, body) = send(app.router(), anonymous_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "blossom-api");
    assert!(body["version"].is_string());
    assert!(!body["build"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_ping_no_auth_required() {
    let app = TestApp::new().await;

    let (status, body) = send(app.router(), anonymous_request("GET", "/api/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ping?!": "PONG" }));
}

#[tokio::test]
async fn test_missing_api_key_rejected() {
    let app = TestApp::new().await;

    let (status, body) = send(app.router(), anonymous_request("GET", "/api/submissions")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or missing API key.");
}

#[tokio::test]
async fn test_wrong_api_key_rejected() {
    let app = TestApp::new().await;

    let request = authed_request("GET", "/api/submissions", "not-a-real-key", None);
    let (status, _) = send(app.router(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_staff_key_forbidden() {
    let app = TestApp::new().await;
    let volunteer = app.volunteer("plainuser", true).await;
    let key = issue_api_key(&app.db, volunteer.id).await.unwrap();

    let request = authed_request("GET", "/api/submissions", &key, None);
    let (status, _) = send(app.router(), request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blacklisted_staff_forbidden() {
    let app = TestApp::new().await;
    set_blacklisted(&app.db, app.staff.id, true).await.unwrap();

    let (status, _) = app.send("GET", "/api/submissions", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Volunteers
// =============================================================================

#[tokio::test]
async fn test_create_volunteer_then_get_existing() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send("POST", "/api/volunteers", Some(json!({ "username": "mrrochester" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "mrrochester");
    assert!(body.get("password_hash").is_none());

    let (status, again) = app
        .send("POST", "/api/volunteers", Some(json!({ "username": "mrrochester" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["id"], body["id"]);
}

#[tokio::test]
async fn test_create_volunteer_requires_username() {
    let app = TestApp::new().await;

    let (status, body) = app.send("POST", "/api/volunteers", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing JSON body key `username`, str; the username of the volunteer."
    );
}

#[tokio::test]
async fn test_volunteer_summary() {
    let app = TestApp::new().await;
    let volunteer = app.volunteer("helenburns", true).await;

    for _ in 0..3 {
        let uri = format!("/api/volunteers/{}/gamma_plusone", volunteer.id);
        let (status, _) = app.send("POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .send("GET", "/api/volunteers/summary?username=helenburns", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gamma"], 3);
    assert_eq!(body["rank"], "Initiate");
    assert_eq!(body["next_rank_at"], 50);
    assert_eq!(body["accepted_coc"], true);
    assert!(body["first_active"].is_null());
}

#[tokio::test]
async fn test_volunteer_summary_errors() {
    let app = TestApp::new().await;

    let (status, _) = app.send("GET", "/api/volunteers/summary", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("GET", "/api/volunteers/summary?username=nobody", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gamma_plusone_returns_new_gamma() {
    let app = TestApp::new().await;
    let volunteer = app.volunteer("adele", false).await;

    let uri = format!("/api/volunteers/{}/gamma_plusone", volunteer.id);
    let (status, body) = app.send("POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gamma"], 1);

    let (status, _) = app.send("POST", "/api/volunteers/999/gamma_plusone", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_accept_coc_twice_conflicts() {
    let app = TestApp::new().await;
    let volunteer = app.volunteer("bertha", false).await;
    let uri = format!("/api/volunteers/{}/accept_coc", volunteer.id);

    let (status, _) = app.send("POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("POST", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_blacklist_zeroes_gamma() {
    let app = TestApp::new().await;
    let volunteer = app.volunteer("blanche", true).await;
    let plusone = format!("/api/volunteers/{}/gamma_plusone", volunteer.id);
    app.send("POST", &plusone, None).await;

    let uri = format!("/api/volunteers/{}/blacklist", volunteer.id);
    let (status, body) = app.send("POST", &uri, Some(json!({ "blacklisted": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blacklisted"], true);

    let (_, summary) = app
        .send("GET", "/api/volunteers/summary?username=blanche", None)
        .await;
    assert_eq!(summary["gamma"], 0);
    assert_eq!(summary["blacklisted"], true);

    let (status, _) = app.send("POST", &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issued_api_key_authenticates_staff() {
    let app = TestApp::new().await;
    let uri = format!("/api/volunteers/{}/api_key", app.staff.id);

    let (status, body) = app.send("POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let new_key = body["api_key"].as_str().unwrap().to_string();
    assert_ne!(new_key, app.api_key);

    // The old key was replaced
    let (status, _) = app.send("GET", "/api/submissions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = authed_request("GET", "/api/submissions", &new_key, None);
    let (status, _) = send(app.router(), request).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Submissions
// =============================================================================

#[tokio::test]
async fn test_create_submission_is_create_or_get() {
    let app = TestApp::new().await;
    let body = json!({
        "original_id": "t3_abc",
        "source": "reddit",
        "url": "https://example.com/a",
        "submission_time": 1_600_000_000,
    });

    let (status, created) = app.send("POST", "/api/submissions", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["original_id"], "t3_abc");
    assert_eq!(created["source"], "reddit");

    let (status, existing) = app.send("POST", "/api/submissions", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(existing["id"], created["id"]);
}

#[tokio::test]
async fn test_create_submission_validation() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send("POST", "/api/submissions", Some(json!({ "source": "reddit" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing JSON body key `original_id`, str; the ID of the post on the external source."
    );

    let (status, body) = app
        .send("POST", "/api/submissions", Some(json!({ "original_id": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing JSON body key `source`, str; where the post came from. 20char max."
    );

    let (status, _) = app
        .send(
            "POST",
            "/api/submissions",
            Some(json!({ "original_id": "x", "source": "a".repeat(21) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_submissions_filters() {
    let app = TestApp::new().await;
    let volunteer = app.volunteer("grace", true).await;
    app.submission("one").await;
    app.submission("two").await;
    let plusone = format!("/api/volunteers/{}/gamma_plusone", volunteer.id);
    app.send("POST", &plusone, None).await;

    let (status, body) = app.send("GET", "/api/submissions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 100);
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    assert!(body["next_page"].is_null());
    assert!(body["previous_page"].is_null());

    let uri = format!("/api/submissions?completed_by={}", volunteer.id);
    let (_, body) = app.send("GET", &uri, None).await;
    assert_eq!(body["total_results"], 1);

    let (_, body) = app.send("GET", "/api/submissions?source=reddit&page=40", None).await;
    assert_eq!(body["total_results"], 2);
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn test_claim_workflow() {
    let app = TestApp::new().await;
    let volunteer = app.volunteer("diana", true).await;
    let submission = app.submission("claimable").await;
    let uri = format!("/api/submissions/{}/claim", submission.id);
    let body = json!({ "username": "diana" });

    let (status, claimed) = app.send("POST", &uri, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["claimed_by"], volunteer.id);
    assert!(claimed["claim_time"].is_string());

    // Re-claiming by the same volunteer is fine
    let (status, _) = app.send("POST", &uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    app.volunteer("mary", true).await;
    let (status, _) = app.send("POST", &uri, Some(json!({ "username": "mary" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_claim_rejections() {
    let app = TestApp::new().await;
    let submission = app.submission("guarded").await;
    let uri = format!("/api/submissions/{}/claim", submission.id);

    let (status, _) = app.send("POST", &uri, Some(json!({ "username": "ghost" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.volunteer("newbie", false).await;
    let (status, _) = app.send("POST", &uri, Some(json!({ "username": "newbie" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let banned = app.volunteer("banned", true).await;
    set_blacklisted(&app.db, banned.id, true).await.unwrap();
    let (status, _) = app.send("POST", &uri, Some(json!({ "username": "banned" }))).await;
    assert_eq!(status, StatusCode::LOCKED);

    app.volunteer("ready", true).await;
    let (status, body) = app
        .send("POST", "/api/submissions/nope/claim", Some(json!({ "username": "ready" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No post found with ID nope!");
}

#[tokio::test]
async fn test_claim_by_original_id_path() {
    let app = TestApp::new().await;
    app.volunteer("john", true).await;
    app.submission("t3_path").await;

    let (status, body) = app
        .send("POST", "/api/submissions/t3_path/claim", Some(json!({ "username": "john" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["original_id"], "t3_path");
}

#[tokio::test]
async fn test_unclaim_rules() {
    let app = TestApp::new().await;
    app.volunteer("st_john", true).await;
    app.volunteer("rosamond", true).await;
    let submission = app.submission("unclaimable").await;
    let claim = format!("/api/submissions/{}/claim", submission.id);
    let unclaim = format!("/api/submissions/{}/unclaim", submission.id);

    let (status, _) = app.send("POST", &unclaim, Some(json!({ "username": "st_john" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.send("POST", &claim, Some(json!({ "username": "st_john" }))).await;

    let (status, _) = app.send("POST", &unclaim, Some(json!({ "username": "rosamond" }))).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);

    let (status, body) = app.send("POST", &unclaim, Some(json!({ "username": "st_john" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["claimed_by"].is_null());
}

#[tokio::test]
async fn test_done_workflow() {
    let app = TestApp::new().await;
    let volunteer = app.volunteer("eliza", true).await;
    let other = app.volunteer("georgiana", true).await;
    let submission = app.submission("finishable").await;
    let claim = format!("/api/submissions/{}/claim", submission.id);
    let done = format!("/api/submissions/{}/done", submission.id);

    // Not claimed by this volunteer
    let (status, _) = app.send("POST", &done, Some(json!({ "username": "eliza" }))).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);

    app.send("POST", &claim, Some(json!({ "username": "eliza" }))).await;

    // No transcription yet
    let (status, _) = app.send("POST", &done, Some(json!({ "username": "eliza" }))).await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);

    // A transcription by someone else does not count
    insert_transcription(&app.db, &transcription(submission.id, other.id, "other")).await.unwrap();
    let (status, _) = app.send("POST", &done, Some(json!({ "username": "eliza" }))).await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);

    let (status, body) = app
        .send("POST", &done, Some(json!({ "username": "eliza", "mod_override": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed_by"], volunteer.id);
    assert_eq!(body["gamma"], 1);
    assert_eq!(body["rank"], "Initiate");

    let (status, _) = app.send("POST", &done, Some(json!({ "username": "eliza" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let unclaim = format!("/api/submissions/{}/unclaim", submission.id);
    let (status, _) = app.send("POST", &unclaim, Some(json!({ "username": "eliza" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_done_with_own_transcription() {
    let app = TestApp::new().await;
    let volunteer = app.volunteer("fairfax", true).await;
    let submission = app.submission("transcribed").await;
    let claim = format!("/api/submissions/{}/claim", submission.id);
    app.send("POST", &claim, Some(json!({ "username": "fairfax" }))).await;
    insert_transcription(&app.db, &transcription(submission.id, volunteer.id, "mine")).await.unwrap();

    let banned = format!("/api/volunteers/{}/blacklist", volunteer.id);
    app.send("POST", &banned, Some(json!({ "blacklisted": true }))).await;
    let done = format!("/api/submissions/{}/done", submission.id);
    let (status, _) = app.send("POST", &done, Some(json!({ "username": "fairfax" }))).await;
    assert_eq!(status, StatusCode::LOCKED);

    app.send("POST", &banned, Some(json!({ "blacklisted": false }))).await;
    let (status, body) = app.send("POST", &done, Some(json!({ "username": "fairfax" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gamma"], 1);
}

#[tokio::test]
async fn test_submission_detail_and_ocr() {
    let app = TestApp::new().await;
    let bot = app.volunteer("transcribot", true).await;
    let submission = app.submission("ocr_post").await;

    let uri = format!("/api/submissions/{}/ocr", submission.id);
    let (status, _) = app.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let ocr = NewTranscription {
        text: None,
        ocr_text: Some("# Title\nsee r/all at https://example.com".to_string()),
        ..transcription(submission.id, bot.id, "ocr1")
    };
    insert_transcription(&app.db, &ocr).await.unwrap();

    let (status, body) = app.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "\\# Title\nsee \\/r/all at <redacted link>");

    let detail = format!("/api/submissions/{}", submission.id);
    let (status, body) = app.send("GET", &detail, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["original_id"], "ocr_post");
    assert_eq!(body["transcriptions"].as_array().unwrap().len(), 1);

    let (status, _) = app.send("GET", "/api/submissions/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn transcription(submission_id: i64, author_id: i64, transcription_id: &str) -> NewTranscription {
    NewTranscription {
        submission_id,
        author_id,
        transcription_id: transcription_id.to_string(),
        completion_method: "ToR".to_string(),
        url: None,
        text: Some("text".to_string()),
        ocr_text: None,
        removed_from_reddit: false,
        post_time: None,
    }
}

#[tokio::test]
async fn test_malformed_path_and_query_return_json_errors() {
    let app = TestApp::new().await;

    let (status, body) = app.send("POST", "/api/volunteers/abc/accept_coc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid path parameter"));

    let (status, body) = app.send("GET", "/api/submissions?completed_by=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));

    let (status, body) = app.send("GET", "/api/submissions?claimed_by=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

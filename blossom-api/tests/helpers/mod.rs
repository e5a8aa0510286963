//! Shared helpers for blossom-api integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use blossom_api::{build_router, AppState};
use blossom_common::db::api_keys::issue_api_key;
use blossom_common::db::submissions::get_or_create_submission;
use blossom_common::db::users::{accept_coc, create_user, set_grafeas_staff};
use blossom_common::db::{init_memory_database, NewSubmission, NewUser, Submission, User};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt;

/// In-memory database plus a staff account and its API key
pub struct TestApp {
    pub db: SqlitePool,
    pub staff: User,
    pub api_key: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = init_memory_database().await.expect("Should create database");
        let staff = create_user(&db, &NewUser::volunteer("janeeyre"))
            .await
            .expect("Should create staff user");
        set_grafeas_staff(&db, staff.id, true).await.unwrap();
        accept_coc(&db, staff.id).await.unwrap();
        let api_key = issue_api_key(&db, staff.id).await.unwrap();

        Self { db, staff, api_key }
    }

    pub fn router(&self) -> Router {
        build_router(AppState::new(self.db.clone()))
    }

    /// Send an authenticated request, returning status and parsed JSON body
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = authed_request(method, uri, &self.api_key, body);
        send(self.router(), request).await
    }

    pub async fn volunteer(&self, username: &str, accepted_coc: bool) -> User {
        let user = create_user(&self.db, &NewUser::volunteer(username)).await.unwrap();
        if accepted_coc {
            accept_coc(&self.db, user.id).await.unwrap();
        }
        user
    }

    pub async fn submission(&self, original_id: &str) -> Submission {
        let new = NewSubmission {
            original_id: Some(original_id.to_string()),
            ..NewSubmission::new("reddit")
        };
        get_or_create_submission(&self.db, &new).await.unwrap().0
    }
}

pub fn authed_request(method: &str, uri: &str, api_key: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Api-Key {}", api_key));
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn anonymous_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Should read body")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, json)
}

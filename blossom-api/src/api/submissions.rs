//! Submission endpoints: create-or-get, listing, and the claim/done workflow

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use blossom_common::db::submissions::{
    claim_submission, complete_submission, count_submissions, find_submission_by_ref,
    get_or_create_submission, list_submissions as query_submissions, unclaim_submission,
    ClaimOutcome, CompleteOutcome, UnclaimOutcome,
};
use blossom_common::db::transcriptions::{
    author_has_transcription, find_ocr_for_submission, list_for_submission, MAX_TAG_LENGTH,
};
use blossom_common::db::users::{find_user_by_username, gamma};
use blossom_common::db::{NewSubmission, Submission, SubmissionFilter, SubmissionRef, Transcription, User};
use blossom_common::formatting::prepare_ocr_template;
use blossom_common::rank::rank_for_gamma;
use blossom_common::Rank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::info;

use super::volunteers::username_from_body;
use super::{missing_key, value_as_string};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{Pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub completed_by: Option<i64>,
    pub claimed_by: Option<i64>,
    pub source: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct SubmissionList {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub results: Vec<Submission>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: Submission,
    pub transcriptions: Vec<Transcription>,
}

#[derive(Debug, Serialize)]
pub struct DoneResponse {
    #[serde(flatten)]
    pub submission: Submission,
    pub gamma: i64,
    pub rank: Rank,
}

/// POST /api/submissions
///
/// Create-or-get keyed by `original_id`: 201 when created, 200 when it existed.
pub async fn create_submission(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Submission>)> {
    let Json(body) = payload?;

    let original_id = value_as_string(body.get("original_id")).ok_or_else(|| {
        missing_key(
            "original_id",
            "str; the ID of the post on the external source.",
        )
    })?;
    let source = value_as_string(body.get("source")).ok_or_else(|| {
        missing_key("source", "str; where the post came from. 20char max.")
    })?;
    if source.chars().count() > MAX_TAG_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "`source` must be {} characters or fewer.",
            MAX_TAG_LENGTH
        )));
    }

    let new = NewSubmission {
        original_id: Some(original_id),
        submission_time: parse_timestamp(body.get("submission_time"))?,
        url: value_as_string(body.get("url")),
        tor_url: value_as_string(body.get("tor_url")),
        redis_id: value_as_string(body.get("redis_id")),
        ..NewSubmission::new(source)
    };

    let (submission, created) = get_or_create_submission(&state.db, &new).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(submission)))
}

/// GET /api/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<SubmissionList>> {
    let Query(query) = query?;
    let filter = SubmissionFilter {
        completed_by: query.completed_by,
        claimed_by: query.claimed_by,
        source: query.source,
    };

    let total = count_submissions(&state.db, &filter).await?;
    let pagination = Pagination::for_page(total, query.page);
    let results = query_submissions(&state.db, &filter, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(SubmissionList { pagination, results }))
}

/// GET /api/submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SubmissionDetail>> {
    let submission = require_submission(&state.db, &id).await?;
    let transcriptions = list_for_submission(&state.db, submission.id).await?;
    Ok(Json(SubmissionDetail { submission, transcriptions }))
}

/// POST /api/submissions/:id/claim
pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Submission>> {
    let Json(body) = payload?;
    let volunteer = require_active_volunteer(&state.db, &body).await?;
    if !volunteer.accepted_coc {
        return Err(ApiError::Forbidden(format!(
            "{} has not accepted the Code of Conduct.",
            volunteer.username
        )));
    }
    let submission = require_submission(&state.db, &id).await?;

    match claim_submission(&state.db, submission.id, volunteer.id).await? {
        ClaimOutcome::Claimed(s) | ClaimOutcome::AlreadyClaimed(s) => Ok(Json(s)),
        ClaimOutcome::ClaimedByOther(_) => Err(ApiError::Conflict(
            "This post has already been claimed.".to_string(),
        )),
    }
}

/// POST /api/submissions/:id/unclaim
pub async fn unclaim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Submission>> {
    let Json(body) = payload?;
    let volunteer = require_active_volunteer(&state.db, &body).await?;
    let submission = require_submission(&state.db, &id).await?;

    match unclaim_submission(&state.db, submission.id, volunteer.id).await? {
        UnclaimOutcome::Unclaimed(s) => Ok(Json(s)),
        UnclaimOutcome::NotClaimed => Err(ApiError::Conflict(
            "This post has not been claimed.".to_string(),
        )),
        UnclaimOutcome::AlreadyCompleted => Err(ApiError::Conflict(
            "This post has already been completed.".to_string(),
        )),
        UnclaimOutcome::ClaimedByOther => Err(ApiError::NotAcceptable(
            "This post is claimed by a different volunteer.".to_string(),
        )),
    }
}

/// POST /api/submissions/:id/done
///
/// The volunteer must hold the claim and have a transcription on the post;
/// `mod_override` skips the transcription check.
pub async fn done(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<DoneResponse>> {
    let Json(body) = payload?;
    let mod_override = body
        .get("mod_override")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let volunteer = require_active_volunteer(&state.db, &body).await?;
    let submission = require_submission(&state.db, &id).await?;

    if submission.completed_by.is_some() {
        return Err(already_completed());
    }
    if submission.claimed_by != Some(volunteer.id) {
        return Err(not_claimant());
    }
    if !mod_override && !author_has_transcription(&state.db, submission.id, volunteer.id).await? {
        return Err(ApiError::PreconditionRequired(format!(
            "No transcription by {} was found on this post.",
            volunteer.username
        )));
    }

    let submission = match complete_submission(&state.db, submission.id, volunteer.id).await? {
        CompleteOutcome::Completed(s) => s,
        CompleteOutcome::AlreadyCompleted => return Err(already_completed()),
        CompleteOutcome::NotClaimedByUser => return Err(not_claimant()),
    };

    let gamma = gamma(&state.db, &volunteer).await?;
    info!(
        "{} completed {} (gamma {})",
        volunteer.username,
        submission.display_id(),
        gamma
    );
    Ok(Json(DoneResponse {
        submission,
        gamma,
        rank: rank_for_gamma(gamma),
    }))
}

/// GET /api/submissions/:id/ocr
pub async fn ocr(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let submission = require_submission(&state.db, &id).await?;
    let text = find_ocr_for_submission(&state.db, submission.id)
        .await?
        .and_then(|t| t.ocr_text)
        .ok_or_else(|| ApiError::NotFound(format!("No OCR transcription found on post {}!", id)))?;

    Ok(Json(json!({
        "submission_id": submission.id,
        "original_id": submission.original_id,
        "text": prepare_ocr_template(&text),
    })))
}

async fn require_submission(pool: &SqlitePool, id: &str) -> ApiResult<Submission> {
    find_submission_by_ref(pool, &SubmissionRef::OriginalId(id.to_string()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No post found with ID {}!", id)))
}

/// Volunteer named in the body; 404 when unknown, 423 when blacklisted
async fn require_active_volunteer(pool: &SqlitePool, body: &Value) -> ApiResult<User> {
    let username = username_from_body(body)?;
    let volunteer = find_user_by_username(pool, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("No volunteer found with that username.".to_string()))?;
    if volunteer.blacklisted {
        return Err(ApiError::Locked(format!("{} is blacklisted.", volunteer.username)));
    }
    Ok(volunteer)
}

fn already_completed() -> ApiError {
    ApiError::Conflict("This post has already been completed.".to_string())
}

fn not_claimant() -> ApiError {
    ApiError::PreconditionFailed("This post is not claimed by this volunteer.".to_string())
}

/// Accept RFC 3339 strings or Unix seconds; absent or null means no timestamp
fn parse_timestamp(value: Option<&Value>) -> ApiResult<Option<DateTime<Utc>>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(blossom_common::time::from_unix_seconds(n.as_f64())),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| {
                ApiError::BadRequest(format!("`submission_time` is not a valid timestamp: {}", s))
            }),
        Some(other) => Err(ApiError::BadRequest(format!(
            "`submission_time` is not a valid timestamp: {}",
            other
        ))),
    }
}

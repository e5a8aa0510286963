//! Transcription endpoints
//!
//! Body keys are checked one at a time in a fixed order so a client always
//! gets the message for the first problem in its request.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use blossom_common::db::submissions::{find_submission_by_original_id, find_submission_by_ref};
use blossom_common::db::transcriptions::{
    find_by_transcription_id, find_real_for_submission, insert_transcription,
    list_for_submission, DUMMY_COMPLETION_METHOD, MAX_TAG_LENGTH,
};
use blossom_common::db::users::{find_user_by_id, find_user_by_ref};
use blossom_common::db::{NewTranscription, Submission, SubmissionRef, Transcription, UserRef};
use blossom_common::formatting::apply_app_fixes;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::{missing_key, value_as_string};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Transcriptions completed through the app get their text sanitised
const APP_COMPLETION_METHOD: &str = "app";

/// Stored as "no URL"
const NO_URL: &str = "None";

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub original_id: Option<String>,
}

/// POST /api/transcriptions
pub async fn create_transcription(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;

    let submission_ref = submission_ref(body.get("submission_id")).ok_or_else(|| {
        missing_key(
            "submission_id",
            "str; the ID of the post the transcription is on.",
        )
    })?;
    let submission = find_submission_by_ref(&state.db, &submission_ref)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No post found with ID {}!", submission_ref)))?;

    let volunteer = match user_ref(body.get("v_id")) {
        Some(user_ref) => find_user_by_ref(&state.db, &user_ref).await?,
        None => None,
    }
    .ok_or_else(|| ApiError::NotFound("No volunteer found with that ID / username.".to_string()))?;

    let transcription_id = value_as_string(body.get("t_id"))
        .ok_or_else(|| missing_key("t_id", "str; the ID of the transcription."))?;

    let completion_method = value_as_string(body.get("completion_method")).ok_or_else(|| {
        missing_key(
            "completion_method",
            "str; the service this transcription was completed through. `app`, `ToR`, etc. 20char max.",
        )
    })?;
    if completion_method.chars().count() > MAX_TAG_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "`completion_method` must be {} characters or fewer.",
            MAX_TAG_LENGTH
        )));
    }

    let url = value_as_string(body.get("t_url")).ok_or_else(|| {
        missing_key(
            "t_url",
            "str; the direct URL for the transcription. Use string `None` if no URL is available.",
        )
    })?;

    let text = value_as_string(body.get("t_text"))
        .ok_or_else(|| missing_key("t_text", "str; the content of the transcription."))?;

    if let Some(existing) = find_by_transcription_id(&state.db, &transcription_id).await? {
        return already_exists(&state.db, &existing).await;
    }

    if completion_method != DUMMY_COMPLETION_METHOD {
        if let Some(real) = find_real_for_submission(&state.db, submission.id).await? {
            return Err(conflict_on(&submission, &real));
        }
    }

    let text = if completion_method == APP_COMPLETION_METHOD {
        apply_app_fixes(&text)
    } else {
        text
    };

    let new = NewTranscription {
        submission_id: submission.id,
        author_id: volunteer.id,
        transcription_id,
        completion_method,
        url: (url != NO_URL).then_some(url),
        text: Some(text),
        ocr_text: None,
        removed_from_reddit: body
            .get("removed_from_reddit")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        post_time: None,
    };

    let created = match insert_transcription(&state.db, &new).await {
        Ok(created) => created,
        // Another request inserted first
        Err(e) if e.is_unique_violation() => {
            warn!("Concurrent insert of transcription {}", new.transcription_id);
            if let Some(existing) = find_by_transcription_id(&state.db, &new.transcription_id).await? {
                return already_exists(&state.db, &existing).await;
            }
            return Err(ApiError::Conflict(format!(
                "Post {} already has a transcription.",
                submission.display_id()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        "Transcription {} created on {} by {}",
        created.transcription_id,
        submission.display_id(),
        volunteer.username
    );
    Ok(Json(json!({
        "success": format!(
            "Transcription ID {} created on post {}, written by {}",
            created.id,
            submission.display_id(),
            volunteer.username
        )
    })))
}

/// GET /api/transcriptions/search?original_id=
pub async fn search_transcriptions(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Transcription>>> {
    let Query(query) = query?;
    let original_id = query
        .original_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("No original_id received. Use ?original_id= in your request.".to_string())
        })?;

    let submission = find_submission_by_original_id(&state.db, &original_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No post found with ID {}!", original_id)))?;

    Ok(Json(list_for_submission(&state.db, submission.id).await?))
}

/// Numbers are internal ids; strings are external ids
fn submission_ref(value: Option<&Value>) -> Option<SubmissionRef> {
    match value? {
        Value::Number(n) => n.as_i64().map(SubmissionRef::Id),
        Value::String(s) => Some(SubmissionRef::OriginalId(s.clone())),
        _ => None,
    }
}

/// Numbers are user ids; strings are usernames
fn user_ref(value: Option<&Value>) -> Option<UserRef> {
    match value? {
        Value::Number(n) => n.as_i64().map(UserRef::Id),
        Value::String(s) => Some(UserRef::Username(s.clone())),
        _ => None,
    }
}

async fn already_exists(pool: &SqlitePool, existing: &Transcription) -> ApiResult<Json<Value>> {
    let post = find_submission_by_ref(pool, &SubmissionRef::Id(existing.submission_id))
        .await?
        .map(|s| s.display_id())
        .unwrap_or_else(|| format!("#{}", existing.submission_id));
    let author = find_user_by_id(pool, existing.author_id)
        .await?
        .map(|u| u.username)
        .unwrap_or_else(|| format!("#{}", existing.author_id));

    Ok(Json(json!({
        "success": format!(
            "Transcription ID {} already exists on post {}, written by {}",
            existing.id, post, author
        )
    })))
}

fn conflict_on(submission: &Submission, real: &Transcription) -> ApiError {
    ApiError::Conflict(format!(
        "Post {} already has a transcription ({}).",
        submission.display_id(),
        real.transcription_id
    ))
}

//! Placeholder records that keep per-volunteer counts accurate
//!
//! Older volunteers have an official gamma larger than the number of
//! transcriptions that can be reconstructed from the external source. Dummy
//! posts and transcriptions pad the difference. Both carry the
//! [`DUMMY_COMPLETION_METHOD`] tag so they never mix with genuine data.

use crate::db::submissions::{insert_submission, NewSubmission, Submission};
use crate::db::transcriptions::{
    insert_transcription, NewTranscription, Transcription, DUMMY_COMPLETION_METHOD, DUMMY_TEXT,
};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Create a dummy post, optionally completed by `volunteer_id`
pub async fn generate_dummy_post(pool: &SqlitePool, volunteer_id: Option<i64>) -> Result<Submission> {
    info!("Creating dummy post...");
    insert_submission(
        pool,
        &NewSubmission {
            completed_by: volunteer_id,
            ..NewSubmission::new(DUMMY_COMPLETION_METHOD)
        },
    )
    .await
}

/// Create a dummy transcription for `volunteer_id`.
///
/// Without a `post`, a dummy post completed by the volunteer is created first,
/// which raises their gamma by one.
pub async fn generate_dummy_transcription(
    pool: &SqlitePool,
    volunteer_id: i64,
    post: Option<&Submission>,
) -> Result<Transcription> {
    let post_id = match post {
        Some(post) => post.id,
        None => generate_dummy_post(pool, Some(volunteer_id)).await?.id,
    };

    info!("Creating dummy transcription...");
    insert_transcription(
        pool,
        &NewTranscription {
            submission_id: post_id,
            author_id: volunteer_id,
            transcription_id: Uuid::new_v4().to_string(),
            completion_method: DUMMY_COMPLETION_METHOD.to_string(),
            url: None,
            text: Some(DUMMY_TEXT.to_string()),
            ocr_text: None,
            removed_from_reddit: false,
            post_time: None,
        },
    )
    .await
}

//! Transcription persistence
//!
//! A submission has at most one real transcription: one with `text` whose
//! completion method is not [`DUMMY_COMPLETION_METHOD`]. OCR output (only
//! `ocr_text`) and dummy padding rows are exempt.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Completion method (and submission source) tag for bootstrap placeholder records
pub const DUMMY_COMPLETION_METHOD: &str = "bootstrap_from_redis";

/// Text stored on dummy transcriptions
pub const DUMMY_TEXT: &str = "dummy transcription";

/// Maximum length of `completion_method` and `source`
pub const MAX_TAG_LENGTH: usize = 20;

/// Transcription record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcription {
    pub id: i64,
    pub submission_id: i64,
    pub author_id: i64,
    pub transcription_id: String,
    pub completion_method: String,
    pub url: Option<String>,
    pub text: Option<String>,
    pub ocr_text: Option<String>,
    pub removed_from_reddit: bool,
    pub post_time: Option<DateTime<Utc>>,
    pub create_time: DateTime<Utc>,
}

impl Transcription {
    pub fn is_dummy(&self) -> bool {
        self.completion_method == DUMMY_COMPLETION_METHOD
    }

    /// OCR output rather than a volunteer's work
    pub fn is_ocr(&self) -> bool {
        self.text.is_none() && self.ocr_text.is_some()
    }
}

/// Fields for creating a transcription
#[derive(Debug, Clone)]
pub struct NewTranscription {
    pub submission_id: i64,
    pub author_id: i64,
    pub transcription_id: String,
    pub completion_method: String,
    pub url: Option<String>,
    pub text: Option<String>,
    pub ocr_text: Option<String>,
    pub removed_from_reddit: bool,
    pub post_time: Option<DateTime<Utc>>,
}

const TRANSCRIPTION_COLUMNS: &str = "id, submission_id, author_id, transcription_id, completion_method, \
     url, text, ocr_text, removed_from_reddit, post_time, create_time";

fn transcription_from_row(row: &SqliteRow) -> Result<Transcription> {
    Ok(Transcription {
        id: row.try_get("id")?,
        submission_id: row.try_get("submission_id")?,
        author_id: row.try_get("author_id")?,
        transcription_id: row.try_get("transcription_id")?,
        completion_method: row.try_get("completion_method")?,
        url: row.try_get("url")?,
        text: row.try_get("text")?,
        ocr_text: row.try_get("ocr_text")?,
        removed_from_reddit: row.try_get("removed_from_reddit")?,
        post_time: row.try_get("post_time")?,
        create_time: row.try_get("create_time")?,
    })
}

/// Insert a transcription.
///
/// Fails with a unique violation if `transcription_id` is taken or the submission
/// already has a real transcription.
pub async fn insert_transcription(pool: &SqlitePool, new: &NewTranscription) -> Result<Transcription> {
    let mut conn = pool.acquire().await?;
    insert_transcription_with(&mut conn, new).await
}

/// [`insert_transcription`] on a given connection, e.g. inside a transaction
pub async fn insert_transcription_with(conn: &mut SqliteConnection, new: &NewTranscription) -> Result<Transcription> {
    let id = sqlx::query(
        r#"
        INSERT INTO transcriptions (
            submission_id, author_id, transcription_id, completion_method, url,
            text, ocr_text, removed_from_reddit, post_time, create_time
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.submission_id)
    .bind(new.author_id)
    .bind(&new.transcription_id)
    .bind(&new.completion_method)
    .bind(&new.url)
    .bind(&new.text)
    .bind(&new.ocr_text)
    .bind(new.removed_from_reddit)
    .bind(new.post_time)
    .bind(crate::time::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    debug!(
        "Inserted transcription {} ({}) on submission {}",
        id, new.transcription_id, new.submission_id
    );

    let row = sqlx::query(&format!(
        "SELECT {} FROM transcriptions WHERE id = ?",
        TRANSCRIPTION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref()
        .map(transcription_from_row)
        .transpose()?
        .ok_or_else(|| Error::Internal(format!("Transcription {} vanished after insert", id)))
}

/// Load transcription by internal id
pub async fn find_transcription_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Transcription>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM transcriptions WHERE id = ?",
        TRANSCRIPTION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(transcription_from_row).transpose()
}

/// Load transcription by its external id
pub async fn find_by_transcription_id(pool: &SqlitePool, transcription_id: &str) -> Result<Option<Transcription>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM transcriptions WHERE transcription_id = ?",
        TRANSCRIPTION_COLUMNS
    ))
    .bind(transcription_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(transcription_from_row).transpose()
}

/// All transcriptions on a submission, oldest first
pub async fn list_for_submission(pool: &SqlitePool, submission_id: i64) -> Result<Vec<Transcription>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM transcriptions WHERE submission_id = ? ORDER BY id ASC",
        TRANSCRIPTION_COLUMNS
    ))
    .bind(submission_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(transcription_from_row).collect()
}

/// The real (volunteer-written, non-dummy) transcription on a submission
pub async fn find_real_for_submission(pool: &SqlitePool, submission_id: i64) -> Result<Option<Transcription>> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {} FROM transcriptions
        WHERE submission_id = ? AND text IS NOT NULL AND completion_method <> ?
        LIMIT 1
        "#,
        TRANSCRIPTION_COLUMNS
    ))
    .bind(submission_id)
    .bind(DUMMY_COMPLETION_METHOD)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(transcription_from_row).transpose()
}

/// The OCR transcription on a submission
pub async fn find_ocr_for_submission(pool: &SqlitePool, submission_id: i64) -> Result<Option<Transcription>> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {} FROM transcriptions
        WHERE submission_id = ? AND text IS NULL AND ocr_text IS NOT NULL
        ORDER BY id ASC
        LIMIT 1
        "#,
        TRANSCRIPTION_COLUMNS
    ))
    .bind(submission_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(transcription_from_row).transpose()
}

/// Whether any transcription exists on a submission
pub async fn submission_has_transcription(pool: &SqlitePool, submission_id: i64) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM transcriptions WHERE submission_id = ?)")
            .bind(submission_id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Whether `author_id` has a transcription on a submission
pub async fn author_has_transcription(pool: &SqlitePool, submission_id: i64, author_id: i64) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM transcriptions WHERE submission_id = ? AND author_id = ?)",
    )
    .bind(submission_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Number of transcriptions written by a user
pub async fn count_for_author(pool: &SqlitePool, author_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transcriptions WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of dummy transcriptions written by a user
pub async fn count_dummies_for_author(pool: &SqlitePool, author_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM transcriptions WHERE author_id = ? AND completion_method = ?",
    )
    .bind(author_id)
    .bind(DUMMY_COMPLETION_METHOD)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

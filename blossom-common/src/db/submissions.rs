//! Submission (transcribable post) persistence
//!
//! At most one submission exists per external `original_id`. Dummy posts created
//! during bootstrap carry no `original_id`.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// Submission record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub id: i64,
    pub original_id: Option<String>,
    pub submission_time: Option<DateTime<Utc>>,
    pub claimed_by: Option<i64>,
    pub claim_time: Option<DateTime<Utc>>,
    pub completed_by: Option<i64>,
    pub complete_time: Option<DateTime<Utc>>,
    pub redis_id: Option<String>,
    pub source: String,
    pub url: Option<String>,
    pub tor_url: Option<String>,
    pub create_time: DateTime<Utc>,
}

impl Submission {
    /// Identifier shown to people: the external id, or `#<id>` for dummy posts
    pub fn display_id(&self) -> String {
        match &self.original_id {
            Some(original_id) => original_id.clone(),
            None => format!("#{}", self.id),
        }
    }
}

/// Fields for creating a submission
#[derive(Debug, Clone, Default)]
pub struct NewSubmission {
    pub original_id: Option<String>,
    pub submission_time: Option<DateTime<Utc>>,
    pub claimed_by: Option<i64>,
    pub claim_time: Option<DateTime<Utc>>,
    pub completed_by: Option<i64>,
    pub complete_time: Option<DateTime<Utc>>,
    pub redis_id: Option<String>,
    pub source: String,
    pub url: Option<String>,
    pub tor_url: Option<String>,
}

impl NewSubmission {
    /// Empty submission from `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }
}

/// Reference to a submission by internal id or external id
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionRef {
    Id(i64),
    OriginalId(String),
}

impl std::fmt::Display for SubmissionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionRef::Id(id) => write!(f, "{}", id),
            SubmissionRef::OriginalId(original_id) => f.write_str(original_id),
        }
    }
}

/// Optional filters for listing submissions
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub completed_by: Option<i64>,
    pub claimed_by: Option<i64>,
    pub source: Option<String>,
}

/// Result of a claim attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(Submission),
    /// The same volunteer already holds the claim
    AlreadyClaimed(Submission),
    ClaimedByOther(Submission),
}

/// Result of an unclaim attempt
#[derive(Debug, Clone, PartialEq)]
pub enum UnclaimOutcome {
    Unclaimed(Submission),
    NotClaimed,
    AlreadyCompleted,
    ClaimedByOther,
}

/// Result of a completion attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    Completed(Submission),
    AlreadyCompleted,
    NotClaimedByUser,
}

const SUBMISSION_COLUMNS: &str = "id, original_id, submission_time, claimed_by, claim_time, \
     completed_by, complete_time, redis_id, source, url, tor_url, create_time";

fn submission_from_row(row: &SqliteRow) -> Result<Submission> {
    Ok(Submission {
        id: row.try_get("id")?,
        original_id: row.try_get("original_id")?,
        submission_time: row.try_get("submission_time")?,
        claimed_by: row.try_get("claimed_by")?,
        claim_time: row.try_get("claim_time")?,
        completed_by: row.try_get("completed_by")?,
        complete_time: row.try_get("complete_time")?,
        redis_id: row.try_get("redis_id")?,
        source: row.try_get("source")?,
        url: row.try_get("url")?,
        tor_url: row.try_get("tor_url")?,
        create_time: row.try_get("create_time")?,
    })
}

/// Insert a submission unconditionally
pub async fn insert_submission(pool: &SqlitePool, new: &NewSubmission) -> Result<Submission> {
    let id = sqlx::query(
        r#"
        INSERT INTO submissions (
            original_id, submission_time, claimed_by, claim_time, completed_by,
            complete_time, redis_id, source, url, tor_url, create_time
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.original_id)
    .bind(new.submission_time)
    .bind(new.claimed_by)
    .bind(new.claim_time)
    .bind(new.completed_by)
    .bind(new.complete_time)
    .bind(&new.redis_id)
    .bind(&new.source)
    .bind(&new.url)
    .bind(&new.tor_url)
    .bind(crate::time::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    debug!("Inserted submission {} ({:?})", id, new.original_id);

    find_submission_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Submission {} vanished after insert", id)))
}

/// Return the submission with `new.original_id`, creating it if absent.
///
/// The boolean is true when a row was created. Submissions without an
/// `original_id` are always created.
pub async fn get_or_create_submission(pool: &SqlitePool, new: &NewSubmission) -> Result<(Submission, bool)> {
    let Some(original_id) = new.original_id.as_deref() else {
        return Ok((insert_submission(pool, new).await?, true));
    };

    if let Some(existing) = find_submission_by_original_id(pool, original_id).await? {
        info!("Found existing submission for {}", original_id);
        return Ok((existing, false));
    }

    match insert_submission(pool, new).await {
        Ok(created) => {
            info!("Created submission {} for {}", created.id, original_id);
            Ok((created, true))
        }
        // Lost a race with another writer
        Err(e) if e.is_unique_violation() => {
            let existing = find_submission_by_original_id(pool, original_id)
                .await?
                .ok_or(e)?;
            Ok((existing, false))
        }
        Err(e) => Err(e),
    }
}

/// Load submission by internal id
pub async fn find_submission_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Submission>> {
    let row = sqlx::query(&format!("SELECT {} FROM submissions WHERE id = ?", SUBMISSION_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(submission_from_row).transpose()
}

/// Load submission by external id
pub async fn find_submission_by_original_id(pool: &SqlitePool, original_id: &str) -> Result<Option<Submission>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM submissions WHERE original_id = ?",
        SUBMISSION_COLUMNS
    ))
    .bind(original_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(submission_from_row).transpose()
}

/// Load submission by reference.
///
/// A string reference is matched against `original_id` first; a numeric string
/// that matches no external id falls back to the internal id.
pub async fn find_submission_by_ref(pool: &SqlitePool, reference: &SubmissionRef) -> Result<Option<Submission>> {
    match reference {
        SubmissionRef::Id(id) => find_submission_by_id(pool, *id).await,
        SubmissionRef::OriginalId(original_id) => {
            if let Some(found) = find_submission_by_original_id(pool, original_id).await? {
                return Ok(Some(found));
            }
            match original_id.trim().parse::<i64>() {
                Ok(id) => find_submission_by_id(pool, id).await,
                Err(_) => Ok(None),
            }
        }
    }
}

/// Claim a submission for a volunteer
pub async fn claim_submission(pool: &SqlitePool, submission_id: i64, user_id: i64) -> Result<ClaimOutcome> {
    let result = sqlx::query(
        "UPDATE submissions SET claimed_by = ?, claim_time = ? WHERE id = ? AND claimed_by IS NULL",
    )
    .bind(user_id)
    .bind(crate::time::now())
    .bind(submission_id)
    .execute(pool)
    .await?;

    let submission = require_submission(pool, submission_id).await?;
    if result.rows_affected() == 1 {
        info!("Submission {} claimed by user {}", submission_id, user_id);
        Ok(ClaimOutcome::Claimed(submission))
    } else if submission.claimed_by == Some(user_id) {
        Ok(ClaimOutcome::AlreadyClaimed(submission))
    } else {
        Ok(ClaimOutcome::ClaimedByOther(submission))
    }
}

/// Release a claim held by `user_id`
pub async fn unclaim_submission(pool: &SqlitePool, submission_id: i64, user_id: i64) -> Result<UnclaimOutcome> {
    let submission = require_submission(pool, submission_id).await?;
    if submission.completed_by.is_some() {
        return Ok(UnclaimOutcome::AlreadyCompleted);
    }
    match submission.claimed_by {
        None => return Ok(UnclaimOutcome::NotClaimed),
        Some(claimant) if claimant != user_id => return Ok(UnclaimOutcome::ClaimedByOther),
        Some(_) => {}
    }

    let result = sqlx::query(
        r#"
        UPDATE submissions SET claimed_by = NULL, claim_time = NULL
        WHERE id = ? AND claimed_by = ? AND completed_by IS NULL
        "#,
    )
    .bind(submission_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        // Changed between the read and the update
        return Ok(UnclaimOutcome::ClaimedByOther);
    }
    info!("Submission {} unclaimed by user {}", submission_id, user_id);
    Ok(UnclaimOutcome::Unclaimed(require_submission(pool, submission_id).await?))
}

/// Mark a submission completed by the volunteer holding its claim
pub async fn complete_submission(pool: &SqlitePool, submission_id: i64, user_id: i64) -> Result<CompleteOutcome> {
    let submission = require_submission(pool, submission_id).await?;
    if submission.completed_by.is_some() {
        return Ok(CompleteOutcome::AlreadyCompleted);
    }
    if submission.claimed_by != Some(user_id) {
        return Ok(CompleteOutcome::NotClaimedByUser);
    }

    let result = sqlx::query(
        r#"
        UPDATE submissions SET completed_by = ?, complete_time = ?
        WHERE id = ? AND claimed_by = ? AND completed_by IS NULL
        "#,
    )
    .bind(user_id)
    .bind(crate::time::now())
    .bind(submission_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(CompleteOutcome::AlreadyCompleted);
    }
    info!("Submission {} completed by user {}", submission_id, user_id);
    Ok(CompleteOutcome::Completed(require_submission(pool, submission_id).await?))
}

/// Count submissions matching `filter`
pub async fn count_submissions(pool: &SqlitePool, filter: &SubmissionFilter) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM submissions
        WHERE (?1 IS NULL OR completed_by = ?1)
          AND (?2 IS NULL OR claimed_by = ?2)
          AND (?3 IS NULL OR source = ?3)
        "#,
    )
    .bind(filter.completed_by)
    .bind(filter.claimed_by)
    .bind(&filter.source)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Page of submissions matching `filter`, newest first
pub async fn list_submissions(
    pool: &SqlitePool,
    filter: &SubmissionFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Submission>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM submissions
        WHERE (?1 IS NULL OR completed_by = ?1)
          AND (?2 IS NULL OR claimed_by = ?2)
          AND (?3 IS NULL OR source = ?3)
        ORDER BY create_time DESC, id DESC
        LIMIT ?4 OFFSET ?5
        "#,
        SUBMISSION_COLUMNS
    ))
    .bind(filter.completed_by)
    .bind(filter.claimed_by)
    .bind(&filter.source)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    rows.iter().map(submission_from_row).collect()
}

async fn require_submission(pool: &SqlitePool, id: i64) -> Result<Submission> {
    find_submission_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Submission {}", id)))
}

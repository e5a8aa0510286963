//! Find-or-create reconciliation of external records against the database
//!
//! Every operation looks the record up by its external identifier first, so
//! running an import twice never duplicates rows.

use blossom_common::db::submissions::{count_submissions, get_or_create_submission};
use blossom_common::db::transcriptions::{insert_transcription_with, submission_has_transcription};
use blossom_common::db::users::{create_user, find_user_by_username};
use blossom_common::db::{NewSubmission, NewTranscription, NewUser, Submission, SubmissionFilter, User};
use blossom_common::time::from_unix_seconds;
use sqlx::SqlitePool;
use tracing::{info, warn};

pub use blossom_common::db::dummy::{generate_dummy_post, generate_dummy_transcription};

use crate::error::Result;
use crate::export::{source_url, ExternalComment, ExternalPost};

/// Account that owns records whose author was deleted
pub const ANON_USERNAME: &str = "GrafeasAnonymousUser";

/// Account that owns OCR transcriptions
pub const TRANSCRIBOT_USERNAME: &str = "transcribot";

/// Source tag and completion method for imported records
pub const IMPORT_SOURCE: &str = "reddit";

/// Whether a find-or-create call made a new row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Created,
    Existing,
}

/// What [`get_or_create_transcription`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptionOutcome {
    pub transcription: Found,
    /// Whether an OCR row was added alongside
    pub ocr_created: bool,
}

/// Existing user, or a new volunteer who has accepted the CoC and has no
/// usable password
pub async fn get_or_create_user(pool: &SqlitePool, username: &str) -> Result<(User, Found)> {
    if let Some(user) = find_user_by_username(pool, username).await? {
        info!("Volunteer {} already exists, using existing record", username);
        return Ok((user, Found::Existing));
    }

    let new_user = NewUser {
        accepted_coc: true,
        ..NewUser::volunteer(username)
    };
    match create_user(pool, &new_user).await {
        Ok(user) => {
            info!("Created volunteer {}", username);
            Ok((user, Found::Created))
        }
        Err(e) if e.is_unique_violation() => {
            let user = find_user_by_username(pool, username).await?.ok_or(e)?;
            Ok((user, Found::Existing))
        }
        Err(e) => Err(e.into()),
    }
}

/// The shared account for deleted authors
pub async fn get_anon_user(pool: &SqlitePool) -> Result<User> {
    Ok(get_or_create_user(pool, ANON_USERNAME).await?.0)
}

/// Submission for an external post, created completed by `volunteer` if absent.
///
/// Missing timestamps on the post or the claim/done comments are stored as null.
pub async fn get_or_create_post(
    pool: &SqlitePool,
    tor_post: &ExternalPost,
    volunteer: &User,
    claim: Option<&ExternalComment>,
    done: Option<&ExternalComment>,
    redis_id: Option<&str>,
) -> Result<(Submission, Found)> {
    let new = NewSubmission {
        original_id: Some(tor_post.id.clone()),
        submission_time: from_unix_seconds(tor_post.created_utc),
        claimed_by: Some(volunteer.id),
        claim_time: claim.and_then(|c| from_unix_seconds(c.created_utc)),
        completed_by: Some(volunteer.id),
        complete_time: done.and_then(|d| from_unix_seconds(d.created_utc)),
        redis_id: redis_id.map(str::to_string),
        url: tor_post.url.clone(),
        tor_url: source_url(tor_post.permalink.as_deref()),
        ..NewSubmission::new(IMPORT_SOURCE)
    };

    let (submission, created) = get_or_create_submission(pool, &new).await?;
    Ok((submission, if created { Found::Created } else { Found::Existing }))
}

/// Transcription from the volunteer's comment, plus the OCR bot's if given.
///
/// Nothing is created when the post already has any transcription. Both rows
/// are written in one transaction, so a failed OCR insert leaves the post
/// without either and a later run retries the pair.
pub async fn get_or_create_transcription(
    pool: &SqlitePool,
    post: &Submission,
    volunteer: &User,
    comment: &ExternalComment,
    body: &str,
    transcribot_text: Option<&str>,
    transcribot_comment: Option<&ExternalComment>,
) -> Result<TranscriptionOutcome> {
    if submission_has_transcription(pool, post.id).await? {
        info!("Found a matching transcription for post {}", post.display_id());
        return Ok(TranscriptionOutcome {
            transcription: Found::Existing,
            ocr_created: false,
        });
    }

    let ocr = match transcribot_comment {
        Some(bot_comment) => {
            let (transcribot, _) = get_or_create_user(pool, TRANSCRIBOT_USERNAME).await?;
            Some(NewTranscription {
                submission_id: post.id,
                author_id: transcribot.id,
                transcription_id: bot_comment.id.clone(),
                completion_method: IMPORT_SOURCE.to_string(),
                url: source_url(bot_comment.permalink.as_deref()),
                text: None,
                ocr_text: transcribot_text.map(str::to_string),
                removed_from_reddit: false,
                post_time: from_unix_seconds(bot_comment.created_utc),
            })
        }
        None => None,
    };

    info!("Creating transcription on post {}", post.display_id());
    let real = NewTranscription {
        submission_id: post.id,
        author_id: volunteer.id,
        transcription_id: comment.id.clone(),
        completion_method: IMPORT_SOURCE.to_string(),
        url: source_url(comment.permalink.as_deref()),
        text: Some(body.to_string()),
        ocr_text: None,
        removed_from_reddit: false,
        post_time: from_unix_seconds(comment.created_utc),
    };

    let mut tx = pool.begin().await?;
    if let Err(e) = insert_transcription_with(&mut tx, &real).await {
        if !e.is_unique_violation() {
            return Err(e.into());
        }
        // The comment id is already on file against another post
        warn!(
            "Transcription {} already exists elsewhere; skipping post {}",
            comment.id,
            post.display_id()
        );
        return Ok(TranscriptionOutcome {
            transcription: Found::Existing,
            ocr_created: false,
        });
    }

    let mut ocr_created = false;
    if let Some(ocr) = &ocr {
        info!("Creating OCR transcription on post {}", post.display_id());
        match insert_transcription_with(&mut tx, ocr).await {
            Ok(_) => ocr_created = true,
            Err(e) if e.is_unique_violation() => {
                warn!("OCR transcription {} already exists", ocr.transcription_id)
            }
            Err(e) => return Err(e.into()),
        }
    }
    tx.commit().await?;

    Ok(TranscriptionOutcome {
        transcription: Found::Created,
        ocr_created,
    })
}

/// Create dummy transcriptions until `volunteer` has completed `official_gamma`
/// submissions. Returns how many were created; never removes any.
pub async fn pad_gamma(pool: &SqlitePool, volunteer: &User, official_gamma: i64) -> Result<i64> {
    // Raw count: a blacklisted volunteer's gamma reads as zero
    let completed = count_submissions(
        pool,
        &SubmissionFilter {
            completed_by: Some(volunteer.id),
            ..SubmissionFilter::default()
        },
    )
    .await?;

    let missing = (official_gamma - completed).max(0);
    for _ in 0..missing {
        generate_dummy_transcription(pool, volunteer.id, None).await?;
    }
    if missing > 0 {
        info!(
            "Padded {} with {} dummy transcriptions to reach gamma {}",
            volunteer.username, missing, official_gamma
        );
    }
    Ok(missing)
}

//! Batch import of an [`Export`]

use blossom_common::db::transcriptions::count_dummies_for_author;
use blossom_common::db::User;
use serde::Serialize;
use sqlx::SqlitePool;
use std::fmt;
use tracing::{info, warn};

use crate::error::Result;
use crate::export::{Export, Record, VolunteerExport};
use crate::reconcile::{
    generate_dummy_transcription, get_anon_user, get_or_create_post, get_or_create_transcription,
    get_or_create_user, pad_gamma, Found,
};

/// Counts of what an import run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub volunteers_created: u64,
    pub volunteers_existing: u64,
    pub posts_created: u64,
    pub posts_existing: u64,
    pub transcriptions_created: u64,
    pub transcriptions_existing: u64,
    pub ocr_created: u64,
    pub dummies_created: u64,
    pub failed: u64,
}

impl ImportReport {
    /// Rows written by this run
    pub fn rows_created(&self) -> u64 {
        self.volunteers_created
            + self.posts_created
            + self.transcriptions_created
            + self.ocr_created
            + self.dummies_created
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "volunteers:     {} created, {} existing",
            self.volunteers_created, self.volunteers_existing
        )?;
        writeln!(
            f,
            "posts:          {} created, {} existing",
            self.posts_created, self.posts_existing
        )?;
        writeln!(
            f,
            "transcriptions: {} created, {} existing, {} OCR",
            self.transcriptions_created, self.transcriptions_existing, self.ocr_created
        )?;
        writeln!(f, "dummies:        {} created", self.dummies_created)?;
        write!(f, "failed records: {}", self.failed)
    }
}

/// Import every volunteer in `export`.
///
/// Records that fail, and volunteers whose dummy padding fails, are logged and
/// counted in [`ImportReport::failed`]. Only a failure to resolve a volunteer
/// account itself aborts the run.
pub async fn run_import(pool: &SqlitePool, export: &Export) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let anon = get_anon_user(pool).await?;

    for volunteer_export in &export.volunteers {
        import_volunteer(pool, volunteer_export, &anon, &mut report).await?;
    }

    info!(
        "Import finished: {} rows created, {} records failed",
        report.rows_created(),
        report.failed
    );
    Ok(report)
}

async fn import_volunteer(
    pool: &SqlitePool,
    export: &VolunteerExport,
    anon: &User,
    report: &mut ImportReport,
) -> Result<()> {
    let volunteer = match export.live_username() {
        Some(username) => {
            let (user, found) = get_or_create_user(pool, username).await?;
            match found {
                Found::Created => report.volunteers_created += 1,
                Found::Existing => report.volunteers_existing += 1,
            }
            Some(user)
        }
        None => None,
    };
    let owner = volunteer.as_ref().unwrap_or(anon);
    info!(
        "Importing {} records for {}",
        export.records.len(),
        owner.username
    );

    let mut postless = 0i64;
    for (index, record) in export.records.iter().enumerate() {
        if record.post.is_none() {
            postless += 1;
            continue;
        }
        if let Err(e) = import_record(pool, record, owner, anon, export.redis_id.as_deref(), report).await {
            warn!(
                "Failed to import record {} for {}: {}",
                index, owner.username, e
            );
            report.failed += 1;
        }
    }

    // Counts on the shared anonymous account are not tracked
    let Some(volunteer) = volunteer else {
        return Ok(());
    };

    if let Err(e) = add_dummies(pool, &volunteer, postless, export.gamma, report).await {
        warn!("Failed to pad the count of {}: {}", volunteer.username, e);
        report.failed += 1;
    }
    Ok(())
}

/// One dummy per postless record, then padding up to the official gamma
async fn add_dummies(
    pool: &SqlitePool,
    volunteer: &User,
    postless: i64,
    official_gamma: Option<i64>,
    report: &mut ImportReport,
) -> Result<()> {
    let existing_dummies = count_dummies_for_author(pool, volunteer.id).await?;
    for _ in existing_dummies..postless {
        generate_dummy_transcription(pool, volunteer.id, None).await?;
        report.dummies_created += 1;
    }

    if let Some(official_gamma) = official_gamma {
        let padded = pad_gamma(pool, volunteer, official_gamma).await?;
        report.dummies_created += padded as u64;
    }
    Ok(())
}

async fn import_record(
    pool: &SqlitePool,
    record: &Record,
    volunteer: &User,
    anon: &User,
    redis_id: Option<&str>,
    report: &mut ImportReport,
) -> Result<()> {
    let Some(tor_post) = record.post.as_ref() else {
        return Ok(());
    };

    let author = match &record.comment {
        Some(comment) if comment.author_deleted() => anon,
        _ => volunteer,
    };

    let (post, found) = get_or_create_post(
        pool,
        tor_post,
        author,
        record.claim.as_ref(),
        record.done.as_ref(),
        redis_id,
    )
    .await?;
    match found {
        Found::Created => report.posts_created += 1,
        Found::Existing => report.posts_existing += 1,
    }

    let Some(comment) = record.comment.as_ref() else {
        return Ok(());
    };
    let outcome = get_or_create_transcription(
        pool,
        &post,
        author,
        comment,
        record.body.as_deref().unwrap_or_default(),
        record.transcribot_text.as_deref(),
        record.transcribot_comment.as_ref(),
    )
    .await?;
    match outcome.transcription {
        Found::Created => report.transcriptions_created += 1,
        Found::Existing => report.transcriptions_existing += 1,
    }
    if outcome.ocr_created {
        report.ocr_created += 1;
    }
    Ok(())
}

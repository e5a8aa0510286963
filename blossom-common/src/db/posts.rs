//! Website post (news, blog and standalone page) persistence

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Website post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub author_id: Option<i64>,
    pub date: DateTime<Utc>,
    pub published: bool,
    /// Shown as its own navbar section instead of in the news feed
    pub standalone_section: bool,
    pub header_order: Option<i64>,
    pub show_in_news_view: bool,
    pub engineeringblogpost: bool,
}

impl Post {
    /// Canonical URL path of the post
    pub fn absolute_url(&self) -> String {
        format!("/posts/{}/", self.slug)
    }
}

/// Editable fields of a post
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub body: String,
    pub published: bool,
    pub standalone_section: bool,
    pub header_order: Option<i64>,
    pub engineeringblogpost: bool,
}

const POST_COLUMNS: &str = "id, title, slug, body, author_id, date, published, standalone_section, \
     header_order, show_in_news_view, engineeringblogpost";

fn post_from_row(row: &SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        body: row.try_get("body")?,
        author_id: row.try_get("author_id")?,
        date: row.try_get("date")?,
        published: row.try_get("published")?,
        standalone_section: row.try_get("standalone_section")?,
        header_order: row.try_get("header_order")?,
        show_in_news_view: row.try_get("show_in_news_view")?,
        engineeringblogpost: row.try_get("engineeringblogpost")?,
    })
}

/// URL slug for a title: lowercase ASCII alphanumerics separated by single dashes
///
/// # Examples
///
/// ```
/// use blossom_common::db::posts::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Blossom 2.0  "), "blossom-2-0");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

/// Slug for `title` not yet used by any post
pub async fn unique_slug(pool: &SqlitePool, title: &str) -> Result<String> {
    let base = slugify(title);
    let mut candidate = base.clone();
    let mut suffix = 2;
    while find_post_by_slug(pool, &candidate).await?.is_some() {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    Ok(candidate)
}

/// Create a post authored by `author_id`
pub async fn create_post(pool: &SqlitePool, fields: &PostFields, author_id: Option<i64>) -> Result<Post> {
    if fields.title.trim().is_empty() {
        return Err(Error::InvalidInput("Title is required".to_string()));
    }
    let slug = unique_slug(pool, &fields.title).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO posts (
            title, slug, body, author_id, date, published, standalone_section,
            header_order, show_in_news_view, engineeringblogpost
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(fields.title.trim())
    .bind(&slug)
    .bind(&fields.body)
    .bind(author_id)
    .bind(crate::time::now())
    .bind(fields.published)
    .bind(fields.standalone_section)
    .bind(fields.header_order)
    .bind(fields.engineeringblogpost)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Created post {} ({})", id, slug);
    require_post(pool, id).await
}

/// Update the editable fields of a post; the slug is kept so links stay valid
pub async fn update_post(pool: &SqlitePool, id: i64, fields: &PostFields) -> Result<Post> {
    if fields.title.trim().is_empty() {
        return Err(Error::InvalidInput("Title is required".to_string()));
    }
    let result = sqlx::query(
        r#"
        UPDATE posts SET
            title = ?, body = ?, published = ?, standalone_section = ?,
            header_order = ?, engineeringblogpost = ?
        WHERE id = ?
        "#,
    )
    .bind(fields.title.trim())
    .bind(&fields.body)
    .bind(fields.published)
    .bind(fields.standalone_section)
    .bind(fields.header_order)
    .bind(fields.engineeringblogpost)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Post {}", id)));
    }
    info!("Updated post {}", id);
    require_post(pool, id).await
}

pub async fn find_post_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(post_from_row).transpose()
}

pub async fn find_post_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(post_from_row).transpose()
}

/// Published news-feed posts, newest first
pub async fn list_news_posts(pool: &SqlitePool) -> Result<Vec<Post>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM posts
        WHERE published = 1 AND standalone_section = 0
          AND show_in_news_view = 1 AND engineeringblogpost = 0
        ORDER BY date DESC, id DESC
        "#,
        POST_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(post_from_row).collect()
}

/// Published engineering blog posts, newest first
pub async fn list_engineering_posts(pool: &SqlitePool) -> Result<Vec<Post>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM posts
        WHERE published = 1 AND engineeringblogpost = 1
        ORDER BY date DESC, id DESC
        "#,
        POST_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(post_from_row).collect()
}

/// Published standalone sections for the navbar, by `header_order`
pub async fn list_standalone_sections(pool: &SqlitePool) -> Result<Vec<Post>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM posts
        WHERE published = 1 AND standalone_section = 1
        ORDER BY header_order IS NULL, header_order ASC, id ASC
        "#,
        POST_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(post_from_row).collect()
}

/// Every post, newest first
pub async fn list_all_posts(pool: &SqlitePool) -> Result<Vec<Post>> {
    let rows = sqlx::query(&format!("SELECT {} FROM posts ORDER BY date DESC, id DESC", POST_COLUMNS))
        .fetch_all(pool)
        .await?;
    rows.iter().map(post_from_row).collect()
}

async fn require_post(pool: &SqlitePool, id: i64) -> Result<Post> {
    find_post_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Post {}", id)))
}

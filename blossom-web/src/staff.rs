//! Staff pages: post editing, admin overview and user creation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use blossom_common::db::posts::{create_post, find_post_by_slug, list_all_posts, update_post};
use blossom_common::db::users::{create_user, find_user_by_username, set_password};
use blossom_common::db::{NewUser, PostFields};
use serde::Deserialize;
use tracing::info;

use crate::auth::Viewer;
use crate::error::{WebError, WebResult};
use crate::render::{self, PostFormValues};
use crate::AppState;

const NEW_POST_SUBHEADER: &str = "Remember to toggle \"Published\" if you want your post to appear!";

/// Submitted post form; unchecked boxes are absent
#[derive(Debug, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub published: Option<String>,
    pub standalone_section: Option<String>,
    pub header_order: Option<String>,
    pub engineeringblogpost: Option<String>,
}

impl PostForm {
    fn values(&self) -> PostFormValues {
        PostFormValues {
            title: self.title.clone(),
            body: self.body.clone(),
            published: self.published.is_some(),
            standalone_section: self.standalone_section.is_some(),
            header_order: self.header_order.clone().unwrap_or_default(),
            engineeringblogpost: self.engineeringblogpost.is_some(),
        }
    }

    fn fields(&self) -> Result<PostFields, String> {
        if self.title.trim().is_empty() {
            return Err("A title is required.".to_string());
        }
        let header_order = match self.header_order.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| "Header order must be a whole number.".to_string())?,
            ),
        };
        Ok(PostFields {
            title: self.title.clone(),
            body: self.body.clone(),
            published: self.published.is_some(),
            standalone_section: self.standalone_section.is_some(),
            header_order,
            engineeringblogpost: self.engineeringblogpost.is_some(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewUserForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub is_grafeas_staff: Option<String>,
}

/// GET /posts/new
pub async fn new_post_form(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> WebResult<Html<String>> {
    viewer.require_grafeas_staff()?;
    let fields = render::post_fields(&PostFormValues::default());
    let content = render::form("Add a new post!", NEW_POST_SUBHEADER, None, "/posts/new", &fields);
    render::page(&state.db, "Add a new post", &content, true).await
}

/// POST /posts/new
pub async fn create_post_submit(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Form(form): Form<PostForm>,
) -> WebResult<Response> {
    let author = viewer.require_grafeas_staff()?;

    let fields = match form.fields() {
        Ok(fields) => fields,
        Err(message) => {
            let content = render::form(
                "Add a new post!",
                NEW_POST_SUBHEADER,
                Some(&message),
                "/posts/new",
                &render::post_fields(&form.values()),
            );
            let page = render::page(&state.db, "Add a new post", &content, true).await?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    let post = create_post(&state.db, &fields, Some(author.id)).await?;
    info!("{} created post {}", author.username, post.slug);
    Ok(Redirect::to(&format!("{}edit", post.absolute_url())).into_response())
}

/// GET /posts/:slug/edit
pub async fn edit_post_form(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(slug): Path<String>,
) -> WebResult<Html<String>> {
    viewer.require_grafeas_staff()?;
    let post = find_post_by_slug(&state.db, &slug)
        .await?
        .ok_or(WebError::NotFound)?;

    let content = render::form(
        &format!("Edit: {}", post.title),
        "",
        None,
        &format!("{}edit", post.absolute_url()),
        &render::post_fields(&PostFormValues::from_post(&post)),
    );
    render::page(&state.db, "Edit post", &content, true).await
}

/// POST /posts/:slug/edit
pub async fn edit_post_submit(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(slug): Path<String>,
    Form(form): Form<PostForm>,
) -> WebResult<Response> {
    let editor = viewer.require_grafeas_staff()?;
    let post = find_post_by_slug(&state.db, &slug)
        .await?
        .ok_or(WebError::NotFound)?;

    let fields = match form.fields() {
        Ok(fields) => fields,
        Err(message) => {
            let content = render::form(
                &format!("Edit: {}", post.title),
                "",
                Some(&message),
                &format!("{}edit", post.absolute_url()),
                &render::post_fields(&form.values()),
            );
            let page = render::page(&state.db, "Edit post", &content, true).await?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    let updated = update_post(&state.db, post.id, &fields).await?;
    info!("{} updated post {}", editor.username, updated.slug);
    Ok(Redirect::to(&updated.absolute_url()).into_response())
}

/// GET /admin
pub async fn admin(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> WebResult<Html<String>> {
    let user = viewer.require_grafeas_staff()?;
    let posts = list_all_posts(&state.db).await?;
    let content = format!("{}{}", render::greeting(user), render::admin(&posts));
    render::page(&state.db, "Admin", &content, true).await
}

/// GET /superadmin/newuser
pub async fn new_user_form(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> WebResult<Html<String>> {
    viewer.require_site_staff()?;
    let content = render::form(
        "Create New User",
        "",
        None,
        "/superadmin/newuser",
        &render::user_fields("", "", false),
    );
    render::page(&state.db, "Create New User", &content, true).await
}

/// POST /superadmin/newuser
pub async fn create_user_submit(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Form(form): Form<NewUserForm>,
) -> WebResult<Response> {
    let admin = viewer.require_site_staff()?;

    let username = form.username.trim();
    let error = if username.is_empty() {
        Some("A username is required.".to_string())
    } else if find_user_by_username(&state.db, username).await?.is_some() {
        Some(format!("The username {} is already taken.", username))
    } else {
        None
    };

    if let Some(message) = error {
        let content = render::form(
            "Create New User",
            "",
            Some(&message),
            "/superadmin/newuser",
            &render::user_fields(&form.username, &form.email, form.is_grafeas_staff.is_some()),
        );
        let page = render::page(&state.db, "Create New User", &content, true).await?;
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    let email = form.email.trim();
    let new_user = NewUser {
        email: (!email.is_empty()).then(|| email.to_string()),
        is_grafeas_staff: form.is_grafeas_staff.is_some(),
        ..NewUser::volunteer(username)
    };
    let user = create_user(&state.db, &new_user).await?;
    if !form.password.is_empty() {
        set_password(&state.db, user.id, Some(&form.password)).await?;
    }
    info!("{} created user {}", admin.username, user.username);

    Ok(Redirect::to("/").into_response())
}

//! HTML rendering
//!
//! Pages are the base layout with `{{PLACEHOLDER}}` slots filled in. Every
//! value that did not come from a trusted template is escaped first; post
//! bodies are stored HTML and are inserted as-is.

use axum::response::Html;
use blossom_common::db::posts::list_standalone_sections;
use blossom_common::db::{Post, User};
use sqlx::SqlitePool;

use crate::error::WebResult;

const BASE_HTML: &str = include_str!("ui/base.html");
const FORM_HTML: &str = include_str!("ui/generic_form.html");

/// Escape text for use in HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap `content` in the site layout.
///
/// The navbar lists published standalone sections in `header_order`.
pub async fn page(pool: &SqlitePool, title: &str, content: &str, fullwidth: bool) -> WebResult<Html<String>> {
    let sections = list_standalone_sections(pool).await?;
    Ok(Html(layout(&sections, title, content, fullwidth)))
}

/// Layout with an explicit navbar; used where the database may be unavailable
pub fn layout(sections: &[Post], title: &str, content: &str, fullwidth: bool) -> String {
    let navbar: String = sections
        .iter()
        .map(|s| format!(r#"<a href="{}">{}</a>"#, escape(&s.absolute_url()), escape(&s.title)))
        .collect::<Vec<_>>()
        .join("\n        ");

    fill(
        BASE_HTML,
        &[
            ("TITLE", &escape(title)),
            ("NAVBAR", &navbar),
            ("MAIN_CLASS", if fullwidth { "fullwidth" } else { "" }),
            ("VERSION", blossom_common::VERSION),
            ("CONTENT", content),
        ],
    )
}

/// Substitute `{{NAME}}` slots in one pass over `template`.
///
/// Inserted values are never scanned again, so a post body containing
/// `{{VERSION}}` stays literal. Unknown slots are left as they are.
fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match slots.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// List of post summaries, newest first
pub fn post_list(heading: &str, posts: &[Post]) -> String {
    let mut html = format!("<h1>{}</h1>\n", escape(heading));
    if posts.is_empty() {
        html.push_str("<p>Nothing here yet.</p>\n");
    }
    for post in posts {
        html.push_str(&format!(
            "<article>\n<h2><a href=\"{}\">{}</a></h2>\n<p class=\"post-meta\">{}</p>\n</article>\n",
            escape(&post.absolute_url()),
            escape(&post.title),
            post.date.format("%B %-d, %Y"),
        ));
    }
    html
}

/// A single post
pub fn post_detail(post: &Post, viewer_is_staff: bool) -> String {
    let mut html = format!("<article>\n<h1>{}</h1>\n", escape(&post.title));
    if !post.standalone_section {
        html.push_str(&format!(
            "<p class=\"post-meta\">{}</p>\n",
            post.date.format("%B %-d, %Y")
        ));
    }
    if !post.published {
        html.push_str("<p class=\"error\">This post is not published.</p>\n");
    }
    html.push_str(&post.body);
    if viewer_is_staff {
        html.push_str(&format!(
            "\n<p><a href=\"{}edit\">Edit this post</a></p>",
            escape(&post.absolute_url())
        ));
    }
    html.push_str("\n</article>\n");
    html
}

/// Staff overview of every post
pub fn admin(posts: &[Post]) -> String {
    let mut html = String::from(
        "<h1>Admin</h1>\n<p><a href=\"/posts/new\">Add a new post</a> | <a href=\"/superadmin/newuser\">Create a user</a></p>\n\
         <table>\n<tr><th>Title</th><th>Published</th><th>Section</th><th>Engineering</th><th>Date</th><th></th></tr>\n",
    );
    for post in posts {
        html.push_str(&format!(
            "<tr><td><a href=\"{url}\">{title}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href=\"{url}edit\">edit</a></td></tr>\n",
            yes_no(post.published),
            yes_no(post.standalone_section),
            yes_no(post.engineeringblogpost),
            post.date.format("%Y-%m-%d"),
            url = escape(&post.absolute_url()),
            title = escape(&post.title),
        ));
    }
    html.push_str("</table>\n");
    html
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Form page body with pre-rendered fields
pub fn form(header: &str, subheader: &str, error: Option<&str>, action: &str, fields: &str) -> String {
    fill(
        FORM_HTML,
        &[
            ("HEADER", &escape(header)),
            ("SUBHEADER", &escape(subheader)),
            ("ERROR", &escape(error.unwrap_or(""))),
            ("ACTION", &escape(action)),
            ("FIELDS", fields),
        ],
    )
}

/// Values shown in the post form
#[derive(Debug, Clone, Default)]
pub struct PostFormValues {
    pub title: String,
    pub body: String,
    pub published: bool,
    pub standalone_section: bool,
    pub header_order: String,
    pub engineeringblogpost: bool,
}

impl PostFormValues {
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            body: post.body.clone(),
            published: post.published,
            standalone_section: post.standalone_section,
            header_order: post.header_order.map(|o| o.to_string()).unwrap_or_default(),
            engineeringblogpost: post.engineeringblogpost,
        }
    }
}

pub fn post_fields(values: &PostFormValues) -> String {
    [
        text_input("title", "Title", &values.title),
        format!(
            "    <label for=\"id_body\">Body</label>\n    <textarea id=\"id_body\" name=\"body\">{}</textarea>",
            escape(&values.body)
        ),
        checkbox("published", "Published", values.published),
        checkbox("standalone_section", "Standalone section", values.standalone_section),
        text_input("header_order", "Header order", &values.header_order),
        checkbox("engineeringblogpost", "Engineering blog post", values.engineeringblogpost),
    ]
    .join("\n")
}

pub fn user_fields(username: &str, email: &str, is_grafeas_staff: bool) -> String {
    [
        text_input("username", "Username", username),
        text_input("email", "Email", email),
        "    <label for=\"id_password\">Password</label>\n    <input type=\"password\" id=\"id_password\" name=\"password\">"
            .to_string(),
        checkbox("is_grafeas_staff", "Grafeas staff", is_grafeas_staff),
    ]
    .join("\n")
}

fn text_input(name: &str, label: &str, value: &str) -> String {
    format!(
        "    <label for=\"id_{name}\">{label}</label>\n    <input type=\"text\" id=\"id_{name}\" name=\"{name}\" value=\"{}\">",
        escape(value)
    )
}

fn checkbox(name: &str, label: &str, checked: bool) -> String {
    format!(
        "    <label><input type=\"checkbox\" name=\"{name}\" value=\"on\"{}> {label}</label>",
        if checked { " checked" } else { "" }
    )
}

/// Short description of a signed-in user for page headers
pub fn greeting(user: &User) -> String {
    format!("<p class=\"post-meta\">Signed in as {}</p>\n", escape(&user.username))
}

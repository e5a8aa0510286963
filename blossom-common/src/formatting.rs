//! Markdown and link escaping for transcription text
//!
//! Transcriptions end up as comments on the external source, so user mentions,
//! subreddit links and raw URLs must not turn into live pings or links, and OCR
//! output must not be interpreted as markdown.

use once_cell::sync::Lazy;
use regex::Regex;

/// `u/name`, `/u/name`, `r/name`, `/r/name` at the start of the text or after whitespace
static REDDIT_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|\s)/?([ur])/").expect("invalid reddit link pattern"));

/// http(s) URLs; the final character may not be closing punctuation
static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s<>()\[\]]*[^\s<>()\[\].,!?:;'"]"#).expect("invalid url pattern")
});

/// Characters that are markdown formatting wherever they appear
static INLINE_MARKDOWN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[*_~`]").expect("invalid inline markdown pattern"));

/// Characters that are markdown formatting only at the start of a line
static LINE_START_MARKDOWN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)([#\-+>])").expect("invalid line markdown pattern"));

/// Replacement text for redacted URLs
pub const REDACTED_LINK: &str = "<redacted link>";

/// Escape user and subreddit references so they do not ping anyone.
///
/// `u/a` and `/u/a` both become `\/u/a`.
pub fn escape_reddit_links(text: &str) -> String {
    REDDIT_LINK.replace_all(text, r"${1}\/${2}/").into_owned()
}

/// Replace every http(s) URL with `<redacted link>`
pub fn redact_urls(text: &str) -> String {
    URL.replace_all(text, REDACTED_LINK).into_owned()
}

/// Escape markdown formatting characters with a backslash
pub fn escape_markdown_formatting(text: &str) -> String {
    let line_escaped = LINE_START_MARKDOWN.replace_all(text, r"${1}\${2}");
    INLINE_MARKDOWN.replace_all(&line_escaped, r"\$0").into_owned()
}

/// Turn raw OCR output into a safe starting point for a volunteer's transcription
pub fn prepare_ocr_template(text: &str) -> String {
    escape_markdown_formatting(&escape_reddit_links(&redact_urls(text)))
}

/// Fixes applied to transcriptions submitted through the Blossom app
pub fn apply_app_fixes(text: &str) -> String {
    escape_reddit_links(&redact_urls(text))
}

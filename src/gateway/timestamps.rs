//! HTML fragment with a user's lifecycle timestamps.

use crate::providers::UserRecord;

/// Shown when the provider has no creation time.
pub const UNAVAILABLE: &str = "Indisponível";
/// Shown when the user has never signed in.
pub const NEVER: &str = "Nunca";

pub fn render_timestamps(record: &UserRecord) -> String {
    let created = record
        .metadata
        .creation_time
        .as_deref()
        .unwrap_or(UNAVAILABLE);
    let last_sign_in = record
        .metadata
        .last_sign_in_time
        .as_deref()
        .unwrap_or(NEVER);

    format!(
        "<p><strong>Data de criação:</strong> {}</p>\n<p><strong>Último acesso:</strong> {}</p>\n",
        escape_html(created),
        escape_html(last_sign_in)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

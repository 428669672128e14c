//! Helpers that keep log lines single-line and bounded when they carry user input
//! (search queries, selected option values, page identifiers).

const MAX_PREVIEW: usize = 120;

/// Escape control characters and cap the length of a user supplied string.
///
/// `\n`, `\r`, `\t` and backslash become two-character escapes, other control characters
/// become `\xNN`. Input longer than the preview limit is cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    let mut chars = s.chars();
    for ch in chars.by_ref().take(MAX_PREVIEW) {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}

/// Render an identifier path as `a > b > c` for log lines.
pub fn format_path<S: AsRef<str>>(path: &[S]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(|id| escape_log(id.as_ref()))
        .collect::<Vec<_>>()
        .join(" > ")
}

//! Shared utility functions.

/// Truncate a string to at most `max_bytes` bytes for log previews,
/// appending `…` when something was cut.
///
/// Never splits a UTF-8 character.
pub fn preview(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}

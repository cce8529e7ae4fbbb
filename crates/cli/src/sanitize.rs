//! Cleanup of free-text input before it reaches the registry

/// Normalize a notice message typed by a person
///
/// Line breaks are kept (`\r\n` becomes `\n`), other control characters are
/// dropped, and surrounding whitespace is trimmed from the result.
pub fn sanitize_message(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n");
    let kept: String = unified
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect();
    kept.trim().to_string()
}

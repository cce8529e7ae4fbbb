//! Rendering of slots for the terminal

use chrono::{DateTime, Utc};
use noticeboard_core::expiry::format_expiry;
use noticeboard_core::Slot;
use std::fmt::Write as _;

/// One line per slot: id, type, message and the expiry when there is one
///
/// Multi-line messages are indented under their first line.
pub fn render_table(slots: &[Slot], now: DateTime<Utc>) -> String {
    if slots.is_empty() {
        return "No notices\n".to_string();
    }
    let mut out = String::new();
    for slot in slots {
        let _ = writeln!(out, "{}", render_slot(slot, now));
    }
    out
}

pub fn render_slot(slot: &Slot, now: DateTime<Utc>) -> String {
    let label = if slot.id.is_legacy() {
        "legacy".to_string()
    } else {
        format!("#{}", slot.id)
    };
    let mut line = format!(
        "{label:>6}  {:<7}  {}",
        slot.notice_type.as_str(),
        slot.message.replace('\n', "\n                 ")
    );
    if let Some(expires_at) = slot.expires_at {
        let state = if slot.is_expired(now) {
            "expired"
        } else {
            "expires"
        };
        let _ = write!(line, "  ({state} {} UTC)", format_expiry(expires_at));
    }
    line
}

/// Pretty JSON for scripts; `type` and `expires_at` follow the slot's serde form
pub fn render_json<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value).map(|mut json| {
        json.push('\n');
        json
    })
}

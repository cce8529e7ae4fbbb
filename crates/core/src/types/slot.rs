//! Slot identifiers and notice records

use super::NoticeType;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Identifier of a notice slot
///
/// `0` is the single legacy slot that predates indexing; indexed slots run
/// from `1` up to the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(u32);

impl SlotId {
    pub const LEGACY: SlotId = SlotId(0);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Validate an id requested by a caller against the indexed range
    pub fn indexed(id: u32, max_slots: u32) -> Result<Self> {
        if (1..=max_slots).contains(&id) {
            Ok(Self(id))
        } else {
            Err(Error::InvalidId { id, max: max_slots })
        }
    }

    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        self.0 == 0
    }

    /// All indexed ids for a registry of the given size, in ascending order
    pub fn indexed_range(max_slots: u32) -> impl Iterator<Item = SlotId> {
        (1..=max_slots).map(SlotId)
    }
}

impl Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SlotId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .map(SlotId)
            .map_err(|_| Error::validation("id", format!("'{s}' is not a slot number")))
    }
}

/// A present notice as read back from the durable store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub message: String,
    #[serde(rename = "type")]
    pub notice_type: NoticeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Slot {
    /// Whether the notice has passed its expiry at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        crate::expiry::is_expired(self.expires_at, now)
    }
}

/// Request to create a notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotice {
    /// Explicit slot, or `None` to let the allocator pick the lowest free one
    pub id: Option<u32>,
    pub message: String,
    pub notice_type: NoticeType,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewNotice {
    pub fn new(message: impl Into<String>, notice_type: NoticeType) -> Self {
        Self {
            id: None,
            message: message.into(),
            notice_type,
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Partial update of an existing notice; unset fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticePatch {
    pub message: Option<String>,
    pub notice_type: Option<NoticeType>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Remove the stored expiry. Ignored when `expires_at` is also supplied.
    pub clear_expiry: bool,
}

impl NoticePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.message.is_none()
            && self.notice_type.is_none()
            && self.expires_at.is_none()
            && !self.clear_expiry
    }

    /// Merge the patch over an existing slot
    #[must_use]
    pub fn apply(&self, existing: &Slot) -> Slot {
        let expires_at = match (self.expires_at, self.clear_expiry) {
            (Some(ts), _) => Some(ts),
            (None, true) => None,
            (None, false) => existing.expires_at,
        };
        Slot {
            id: existing.id,
            message: self
                .message
                .clone()
                .unwrap_or_else(|| existing.message.clone()),
            notice_type: self.notice_type.unwrap_or(existing.notice_type),
            expires_at,
        }
    }
}

/// Check a message against the configured length bound, counted in code points
pub fn validate_message(message: &str, max_len: usize) -> Result<()> {
    if message.trim().is_empty() {
        return Err(Error::validation("message", "must not be empty"));
    }
    let len = message.chars().count();
    if len > max_len {
        return Err(Error::validation(
            "message",
            format!("is {len} characters long, the limit is {max_len}"),
        ));
    }
    Ok(())
}

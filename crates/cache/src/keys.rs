//! Key formatting for the durable store and the shared cache
//!
//! This is the only module that builds or parses raw key strings.
//!
//! Durable keys (prefix `admin_notice`):
//!
//! | slot    | message                  | type                  | expiry                   |
//! |---------|--------------------------|-----------------------|--------------------------|
//! | legacy  | `admin_notice_message`   | `admin_notice_type`   | `admin_notice_expires`   |
//! | indexed | `admin_notice_3_message` | `admin_notice_3_type` | `admin_notice_3_expires` |

use noticeboard_core::SlotId;

/// One of the independently stored fields of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotField {
    Message,
    Type,
    Expires,
}

impl SlotField {
    pub const ALL: [SlotField; 3] = [SlotField::Message, SlotField::Type, SlotField::Expires];

    const fn suffix(&self) -> &'static str {
        match self {
            SlotField::Message => "message",
            SlotField::Type => "type",
            SlotField::Expires => "expires",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.suffix() == suffix)
    }
}

/// Durable store key layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    prefix: String,
}

impl KeyLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Key holding one field of one slot
    pub fn field(&self, id: SlotId, field: SlotField) -> String {
        if id.is_legacy() {
            format!("{}_{}", self.prefix, field.suffix())
        } else {
            format!("{}_{}_{}", self.prefix, id, field.suffix())
        }
    }

    pub fn message(&self, id: SlotId) -> String {
        self.field(id, SlotField::Message)
    }

    /// All three keys of a slot
    pub fn slot_keys(&self, id: SlotId) -> [String; 3] {
        SlotField::ALL.map(|field| self.field(id, field))
    }

    /// Prefix covering every indexed key (legacy keys also match and are skipped by
    /// [`KeyLayout::parse_indexed`])
    pub fn indexed_scan_prefix(&self) -> String {
        format!("{}_", self.prefix)
    }

    /// Recognize an indexed slot key, returning its id and field
    pub fn parse_indexed(&self, key: &str) -> Option<(SlotId, SlotField)> {
        let rest = key.strip_prefix(&self.prefix)?.strip_prefix('_')?;
        let (id, suffix) = rest.split_once('_')?;
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let id: u32 = id.parse().ok()?;
        if id == 0 {
            return None;
        }
        Some((SlotId::new(id), SlotField::from_suffix(suffix)?))
    }
}

/// Shared cache key layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    namespace: String,
}

impl CacheKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn lock(&self, scope: &str) -> String {
        format!("{}:lock:{}", self.namespace, scope)
    }

    pub fn indexed_slots(&self) -> String {
        format!("{}:indexed_slots", self.namespace)
    }

    pub fn legacy_slot(&self) -> String {
        format!("{}:legacy_slot", self.namespace)
    }

    pub fn next_id(&self) -> String {
        format!("{}:next_id", self.namespace)
    }

    /// Every projection key cleared by an invalidation
    pub fn projections(&self) -> [String; 3] {
        [self.indexed_slots(), self.legacy_slot(), self.next_id()]
    }
}

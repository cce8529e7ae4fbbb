//! Cache-aside projections of the durable store
//!
//! Three projections live in the shared cache:
//!
//! - the indexed slots, built from one prefix scan (TTL: snapshot TTL)
//! - the legacy slot, or a sentinel recording that it is absent (TTL:
//!   snapshot TTL)
//! - the lowest free indexed id (TTL: next-id TTL)
//!
//! Every projection is disposable. Unreadable or missing entries fall back
//! to the store, and cache write failures only cost a later re-read.
//! Mutations clear all three as their last step while still holding their
//! lock scope.

use crate::concurrent::DistributedMutex;
use crate::keys::{CacheKeys, KeyLayout, SlotField};
use crate::traits::{DurableStore, SharedCache};
use noticeboard_core::expiry::read_stored_expiry;
use noticeboard_core::{NoticeType, RegistryConfig, Result, Slot, SlotId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Lock scope serializing stand-alone invalidations
pub const INVALIDATION_SCOPE: &str = "cache_invalidation";

/// Cached answer of the allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum NextIdHint {
    Free(SlotId),
    Exhausted,
}

impl NextIdHint {
    /// Lowest id in `1..=max_slots` missing from `present`
    pub fn compute<'a>(present: impl IntoIterator<Item = &'a SlotId>, max_slots: u32) -> Self {
        let taken: std::collections::HashSet<&SlotId> = present.into_iter().collect();
        SlotId::indexed_range(max_slots)
            .find(|id| !taken.contains(id))
            .map_or(NextIdHint::Exhausted, NextIdHint::Free)
    }

    pub fn free_id(&self) -> Option<SlotId> {
        match self {
            NextIdHint::Free(id) => Some(*id),
            NextIdHint::Exhausted => None,
        }
    }
}

/// Cached state of the legacy slot; `Absent` is a confirmed negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum LegacyEntry {
    Present { slot: Slot },
    Absent,
}

#[derive(Default)]
struct RawSlot {
    message: Option<String>,
    notice_type: Option<String>,
    expires: Option<String>,
}

/// Build a slot from its stored fields; only the message is required
fn assemble_slot(
    id: SlotId,
    message: String,
    notice_type: Option<&str>,
    expires: Option<&str>,
) -> Slot {
    Slot {
        id,
        message,
        notice_type: NoticeType::normalize(notice_type),
        expires_at: expires.and_then(read_stored_expiry),
    }
}

/// Batched, cached read access to the slots in the durable store
#[derive(Clone)]
pub struct AggregationCache {
    store: Arc<dyn DurableStore>,
    cache: Arc<dyn SharedCache>,
    mutex: DistributedMutex,
    layout: KeyLayout,
    keys: CacheKeys,
    snapshot_ttl: Duration,
    next_id_ttl: Duration,
}

impl std::fmt::Debug for AggregationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationCache")
            .field("layout", &self.layout)
            .field("keys", &self.keys)
            .field("snapshot_ttl", &self.snapshot_ttl)
            .field("next_id_ttl", &self.next_id_ttl)
            .finish_non_exhaustive()
    }
}

impl AggregationCache {
    pub fn new(
        store: Arc<dyn DurableStore>,
        cache: Arc<dyn SharedCache>,
        mutex: DistributedMutex,
        config: &RegistryConfig,
    ) -> Self {
        Self {
            store,
            cache,
            mutex,
            layout: KeyLayout::new(&config.key_prefix),
            keys: CacheKeys::new(&config.cache_namespace),
            snapshot_ttl: config.snapshot_ttl(),
            next_id_ttl: config.next_id_ttl(),
        }
    }

    /// All present indexed slots, from the cache or one prefix scan
    pub async fn indexed_slots(&self) -> Result<BTreeMap<SlotId, Slot>> {
        let key = self.keys.indexed_slots();
        if let Some(slots) = self.read_cached::<Vec<Slot>>(&key).await {
            tracing::debug!(count = slots.len(), "indexed slots served from cache");
            return Ok(slots.into_iter().map(|slot| (slot.id, slot)).collect());
        }

        tracing::debug!("indexed slots cache miss");
        let slots = self.load_indexed_slots().await?;
        let cached: Vec<&Slot> = slots.values().collect();
        self.write_cached(&key, &cached, self.snapshot_ttl).await;
        Ok(slots)
    }

    /// The legacy slot, from the cache (including a cached absence) or the store
    pub async fn legacy_slot(&self) -> Result<Option<Slot>> {
        let key = self.keys.legacy_slot();
        if let Some(entry) = self.read_cached::<LegacyEntry>(&key).await {
            tracing::debug!("legacy slot served from cache");
            return Ok(match entry {
                LegacyEntry::Present { slot } => Some(slot),
                LegacyEntry::Absent => None,
            });
        }

        tracing::debug!("legacy slot cache miss");
        let slot = self.load_slot(SlotId::LEGACY).await?;
        let entry = match &slot {
            Some(slot) => LegacyEntry::Present { slot: slot.clone() },
            None => LegacyEntry::Absent,
        };
        self.write_cached(&key, &entry, self.snapshot_ttl).await;
        Ok(slot)
    }

    /// The cached allocator hint, if one is live
    pub async fn next_id_hint(&self) -> Option<NextIdHint> {
        self.read_cached(&self.keys.next_id()).await
    }

    pub async fn store_next_id_hint(&self, hint: NextIdHint) {
        self.write_cached(&self.keys.next_id(), &hint, self.next_id_ttl)
            .await;
    }

    /// Clear every projection under the invalidation scope
    pub async fn invalidate_all(&self) -> Result<()> {
        self.mutex
            .run(INVALIDATION_SCOPE, || self.clear_projections())
            .await
    }

    /// Clear every projection; callers must already hold a lock scope
    pub(crate) async fn clear_projections(&self) -> Result<()> {
        for key in self.keys.projections() {
            self.cache.delete(&key).await?;
        }
        tracing::debug!("slot projections invalidated");
        Ok(())
    }

    /// Scan the store for every indexed slot, bypassing the cache
    pub async fn load_indexed_slots(&self) -> Result<BTreeMap<SlotId, Slot>> {
        let entries = self
            .store
            .scan_prefix(&self.layout.indexed_scan_prefix())
            .await?;

        let mut raw: HashMap<SlotId, RawSlot> = HashMap::new();
        for (key, value) in entries {
            let Some((id, field)) = self.layout.parse_indexed(&key) else {
                continue;
            };
            let slot = raw.entry(id).or_default();
            match field {
                SlotField::Message => slot.message = Some(value),
                SlotField::Type => slot.notice_type = Some(value),
                SlotField::Expires => slot.expires = Some(value),
            }
        }

        Ok(raw
            .into_iter()
            .filter_map(|(id, raw)| {
                let message = raw.message?;
                Some((
                    id,
                    assemble_slot(
                        id,
                        message,
                        raw.notice_type.as_deref(),
                        raw.expires.as_deref(),
                    ),
                ))
            })
            .collect())
    }

    /// Read one slot straight from the store
    pub async fn load_slot(&self, id: SlotId) -> Result<Option<Slot>> {
        let Some(message) = self.store.get(&self.layout.message(id)).await? else {
            return Ok(None);
        };
        let notice_type = self
            .store
            .get(&self.layout.field(id, SlotField::Type))
            .await?;
        let expires = self
            .store
            .get(&self.layout.field(id, SlotField::Expires))
            .await?;
        Ok(Some(assemble_slot(
            id,
            message,
            notice_type.as_deref(),
            expires.as_deref(),
        )))
    }

    async fn read_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(
                    key,
                    error = %e,
                    "shared cache read failed, falling back to store"
                );
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding undecodable cache entry");
                if let Err(e) = self.cache.delete(key).await {
                    tracing::warn!(key, error = %e, "failed to drop undecodable cache entry");
                }
                None
            }
        }
    }

    async fn write_cached<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.cache.set_with_ttl(key, &encoded, ttl).await {
            tracing::warn!(key, error = %e, "shared cache write failed");
        }
    }
}

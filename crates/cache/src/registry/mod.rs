//! Slot registry: allocation, lifecycle and reads of notice slots
//!
//! Reads go through the [`AggregationCache`]. Every mutation:
//!
//! 1. asks the [`Authorizer`] and validates input, before touching anything
//! 2. takes a [`DistributedMutex`] scope
//! 3. re-checks its preconditions against the durable store
//! 4. writes the store
//! 5. clears the cached projections
//! 6. releases the scope
//!
//! Creation (explicit or allocated id) runs under [`ALLOCATION_SCOPE`] and,
//! once the id is known, also under that slot's `cleanup_{id}`; the two are
//! always taken in that order. Update and delete of one slot run under
//! `cleanup_{id}` only, so mutations of different slots do not wait for
//! each other.

mod allocator;
mod lifecycle;


use crate::aggregation::AggregationCache;
use crate::backends::{MemoryCache, MemoryStore};
use crate::concurrent::DistributedMutex;
use crate::keys::{CacheKeys, KeyLayout};
use crate::security::audit::{AuditEvent, AuditSink, MutationOutcome, TracingAuditSink};
use crate::security::authorization::{
    AllowAll, Authorization, Authorizer, CallerContext, RegistryOperation,
};
use crate::traits::{DurableStore, SharedCache};
use noticeboard_core::{Error, RegistryConfig, Result, Slot, SlotId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lock scope guarding id allocation and slot creation
pub const ALLOCATION_SCOPE: &str = "slot_allocation";

/// Lock scope guarding updates and deletion of one slot
pub fn slot_scope(id: SlotId) -> String {
    format!("cleanup_{id}")
}

/// Registry of notice slots backed by a durable store and a shared cache
#[derive(Clone)]
pub struct SlotRegistry {
    store: Arc<dyn DurableStore>,
    aggregation: AggregationCache,
    mutex: DistributedMutex,
    layout: KeyLayout,
    authorizer: Arc<dyn Authorizer>,
    audit: Arc<dyn AuditSink>,
    config: RegistryConfig,
}

impl std::fmt::Debug for SlotRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotRegistry")
            .field("config", &self.config)
            .field("aggregation", &self.aggregation)
            .finish_non_exhaustive()
    }
}

impl SlotRegistry {
    /// Start building a registry over the given adapters
    pub fn builder(
        store: Arc<dyn DurableStore>,
        cache: Arc<dyn SharedCache>,
    ) -> SlotRegistryBuilder {
        SlotRegistryBuilder::new(store, cache)
    }

    /// Registry over fresh in-memory adapters with default settings
    pub fn in_memory() -> Result<Self> {
        Self::builder(Arc::new(MemoryStore::new()), Arc::new(MemoryCache::new())).build()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The cached projections, for callers that need an explicit invalidation
    pub fn aggregation(&self) -> &AggregationCache {
        &self.aggregation
    }

    /// Every present slot, legacy included, without expiry filtering
    pub async fn get_all(&self) -> Result<BTreeMap<SlotId, Slot>> {
        let mut slots = self.aggregation.indexed_slots().await?;
        if let Some(legacy) = self.aggregation.legacy_slot().await? {
            slots.insert(SlotId::LEGACY, legacy);
        }
        Ok(slots)
    }

    /// One present slot, without expiry filtering
    pub async fn get(&self, id: SlotId) -> Result<Option<Slot>> {
        if id.is_legacy() {
            return self.aggregation.legacy_slot().await;
        }
        Ok(self.aggregation.indexed_slots().await?.remove(&id))
    }

    /// Reject ids that are neither the legacy slot nor in the indexed range
    fn check_addressable(&self, id: SlotId) -> Result<()> {
        if id.is_legacy() {
            return Ok(());
        }
        SlotId::indexed(id.get(), self.config.max_slots).map(|_| ())
    }

    fn authorize(&self, operation: RegistryOperation, ctx: &CallerContext) -> Result<()> {
        match self.authorizer.authorize(operation, ctx) {
            Authorization::Allowed => Ok(()),
            Authorization::Denied(reason) => {
                tracing::info!(
                    %operation,
                    principal = %ctx.principal,
                    %reason,
                    "mutation denied"
                );
                self.audit.record(AuditEvent::AuthorizationDenied {
                    operation,
                    principal: ctx.principal.clone(),
                    reason: reason.clone(),
                });
                Err(Error::permission_denied(operation.as_str(), reason))
            }
        }
    }

    fn record_mutation<T>(
        &self,
        operation: RegistryOperation,
        id: Option<SlotId>,
        ctx: &CallerContext,
        result: &Result<T>,
        slots: impl FnOnce(&T) -> usize,
    ) {
        let outcome = match result {
            Ok(value) => MutationOutcome::Success {
                slots: slots(value),
            },
            Err(e) => {
                if e.is_precondition() {
                    tracing::debug!(%operation, error = %e, "mutation rejected");
                } else {
                    tracing::warn!(%operation, error = %e, "mutation failed");
                }
                MutationOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        };
        self.audit.record(AuditEvent::mutation(
            operation,
            id.map(|id| id.get()),
            ctx,
            outcome,
        ));
    }
}

/// Builder for [`SlotRegistry`]
pub struct SlotRegistryBuilder {
    store: Arc<dyn DurableStore>,
    cache: Arc<dyn SharedCache>,
    config: RegistryConfig,
    authorizer: Arc<dyn Authorizer>,
    audit: Arc<dyn AuditSink>,
}

impl SlotRegistryBuilder {
    pub fn new(store: Arc<dyn DurableStore>, cache: Arc<dyn SharedCache>) -> Self {
        Self {
            store,
            cache,
            config: RegistryConfig::default(),
            authorizer: Arc::new(AllowAll),
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Validate the configuration and wire the components together
    pub fn build(self) -> Result<SlotRegistry> {
        self.config.validate()?;
        let mutex = DistributedMutex::new(
            self.cache.clone(),
            CacheKeys::new(&self.config.cache_namespace),
            self.config.lock.clone(),
            self.audit.clone(),
        );
        let aggregation = AggregationCache::new(
            self.store.clone(),
            self.cache,
            mutex.clone(),
            &self.config,
        );
        Ok(SlotRegistry {
            store: self.store,
            aggregation,
            mutex,
            layout: KeyLayout::new(&self.config.key_prefix),
            authorizer: self.authorizer,
            audit: self.audit,
            config: self.config,
        })
    }
}

//! Mutating operations and the display read path

use super::{slot_scope, SlotRegistry, ALLOCATION_SCOPE};
use crate::keys::SlotField;
use crate::security::authorization::{Authorization, CallerContext, RegistryOperation};
use chrono::{DateTime, Utc};
use noticeboard_core::expiry::{format_expiry, to_stored_precision, validate_expiry};
use noticeboard_core::{validate_message, Error, NewNotice, NoticePatch, Result, Slot, SlotId};

impl SlotRegistry {
    /// Store a new notice and return the slot it landed in
    ///
    /// With an explicit id the slot must be free, otherwise the lowest free
    /// indexed id is taken.
    pub async fn create(
        &self,
        notice: NewNotice,
        ctx: &CallerContext,
        now: DateTime<Utc>,
    ) -> Result<SlotId> {
        self.authorize(RegistryOperation::Create, ctx)?;
        let requested = notice.id.map(SlotId::new);
        let result = self.create_inner(notice, now).await;
        let audited_id = result.as_ref().ok().copied().or(requested);
        self.record_mutation(RegistryOperation::Create, audited_id, ctx, &result, |_| 1);
        result
    }

    async fn create_inner(&self, mut notice: NewNotice, now: DateTime<Utc>) -> Result<SlotId> {
        validate_message(&notice.message, self.config.max_message_len)?;
        notice.expires_at = notice.expires_at.map(to_stored_precision);
        if let Some(expires_at) = notice.expires_at {
            validate_expiry(expires_at, now, self.config.expiry_buffer())?;
        }
        let explicit = notice
            .id
            .map(|id| SlotId::indexed(id, self.config.max_slots))
            .transpose()?;

        self.mutex
            .run(ALLOCATION_SCOPE, || self.create_locked(explicit, &notice))
            .await
    }

    async fn create_locked(&self, explicit: Option<SlotId>, notice: &NewNotice) -> Result<SlotId> {
        let id = match explicit {
            Some(id) => id,
            None => self.allocate_locked().await?,
        };
        // Allocation scope first, slot scope second; update and delete of
        // this slot take only the latter
        self.mutex
            .run(&slot_scope(id), || self.insert_locked(id, notice))
            .await?;
        tracing::info!(slot = %id, "notice created");
        Ok(id)
    }

    async fn insert_locked(&self, id: SlotId, notice: &NewNotice) -> Result<()> {
        if self.store.get(&self.layout.message(id)).await?.is_some() {
            return Err(Error::SlotOccupied { id });
        }
        self.persist(&Self::slot_from(id, notice)).await?;
        self.aggregation.clear_projections().await
    }

    fn slot_from(id: SlotId, notice: &NewNotice) -> Slot {
        Slot {
            id,
            message: notice.message.clone(),
            notice_type: notice.notice_type,
            expires_at: notice.expires_at,
        }
    }

    /// Merge `patch` into an existing notice and return the stored result
    pub async fn update(
        &self,
        id: SlotId,
        patch: NoticePatch,
        ctx: &CallerContext,
        now: DateTime<Utc>,
    ) -> Result<Slot> {
        self.authorize(RegistryOperation::Update, ctx)?;
        let result = self.update_inner(id, patch, now).await;
        self.record_mutation(RegistryOperation::Update, Some(id), ctx, &result, |_| 1);
        result
    }

    async fn update_inner(
        &self,
        id: SlotId,
        mut patch: NoticePatch,
        now: DateTime<Utc>,
    ) -> Result<Slot> {
        self.check_addressable(id)?;
        patch.expires_at = patch.expires_at.map(to_stored_precision);
        if patch.is_empty() {
            return Err(Error::validation("update", "no changes requested"));
        }
        if let Some(message) = &patch.message {
            validate_message(message, self.config.max_message_len)?;
        }
        if let Some(expires_at) = patch.expires_at {
            validate_expiry(expires_at, now, self.config.expiry_buffer())?;
        }

        self.mutex
            .run(&slot_scope(id), || self.update_locked(id, &patch))
            .await
    }

    async fn update_locked(&self, id: SlotId, patch: &NoticePatch) -> Result<Slot> {
        let existing = self
            .aggregation
            .load_slot(id)
            .await?
            .ok_or(Error::SlotNotFound { id })?;
        let updated = patch.apply(&existing);
        self.persist(&updated).await?;
        self.aggregation.clear_projections().await?;
        tracing::info!(slot = %id, "notice updated");
        Ok(updated)
    }

    /// Remove one notice; returns the number of slots removed
    pub async fn delete(&self, id: SlotId, ctx: &CallerContext) -> Result<usize> {
        self.authorize(RegistryOperation::Delete, ctx)?;
        let result = self.delete_inner(id).await;
        self.record_mutation(RegistryOperation::Delete, Some(id), ctx, &result, |n| *n);
        result
    }

    async fn delete_inner(&self, id: SlotId) -> Result<usize> {
        self.check_addressable(id)?;
        self.remove_locked(id).await
    }

    /// Remove every present notice, legacy included; returns how many went
    ///
    /// Each slot is removed under its own scope. A slot that disappears
    /// concurrently is skipped; any other failure stops the sweep.
    pub async fn delete_all(&self, ctx: &CallerContext) -> Result<usize> {
        self.authorize(RegistryOperation::DeleteAll, ctx)?;
        let result = self.delete_all_inner().await;
        self.record_mutation(RegistryOperation::DeleteAll, None, ctx, &result, |n| *n);
        result
    }

    async fn delete_all_inner(&self) -> Result<usize> {
        let mut targets: Vec<SlotId> = self
            .aggregation
            .load_indexed_slots()
            .await?
            .into_keys()
            .collect();
        if self.aggregation.load_slot(SlotId::LEGACY).await?.is_some() {
            targets.push(SlotId::LEGACY);
        }

        let mut removed = 0;
        for id in targets {
            match self.remove_locked(id).await {
                Ok(n) => removed += n,
                Err(Error::SlotNotFound { .. }) => {
                    tracing::debug!(slot = %id, "slot vanished during delete-all");
                }
                Err(e) => return Err(e),
            }
        }
        self.aggregation.invalidate_all().await?;
        tracing::info!(removed, "all notices deleted");
        Ok(removed)
    }

    /// Present notices that have not expired at `now`, ordered by id
    ///
    /// Expired notices found along the way are deleted on behalf of the
    /// system caller. Failures while doing so are logged and never surface
    /// to the reader.
    pub async fn list_for_display(&self, now: DateTime<Utc>) -> Result<Vec<Slot>> {
        let all = self.get_all().await?;
        let (expired, live): (Vec<Slot>, Vec<Slot>) =
            all.into_values().partition(|slot| slot.is_expired(now));
        for slot in expired {
            self.expire(slot.id).await;
        }
        Ok(live)
    }

    async fn expire(&self, id: SlotId) {
        let ctx = CallerContext::system();
        if let Authorization::Denied(reason) =
            self.authorizer.authorize(RegistryOperation::Expire, &ctx)
        {
            tracing::debug!(slot = %id, %reason, "expired notice left in place");
            return;
        }
        let result = self.remove_locked(id).await;
        match &result {
            Ok(_) => tracing::info!(slot = %id, "expired notice removed"),
            Err(Error::SlotNotFound { .. }) => return,
            // logged by record_mutation
            Err(_) => {}
        }
        self.record_mutation(RegistryOperation::Expire, Some(id), &ctx, &result, |n| *n);
    }

    /// Delete a slot's keys under its scope; `SlotNotFound` when absent
    async fn remove_locked(&self, id: SlotId) -> Result<usize> {
        self.mutex
            .run(&slot_scope(id), || self.remove_slot_keys(id))
            .await
    }

    async fn remove_slot_keys(&self, id: SlotId) -> Result<usize> {
        let [message_key, type_key, expires_key] = self.layout.slot_keys(id);
        if self.store.get(&message_key).await?.is_none() {
            return Err(Error::SlotNotFound { id });
        }
        // message first: the slot reads as absent from here on
        for key in [message_key, type_key, expires_key] {
            self.store.delete(&key).await?;
        }
        self.aggregation.clear_projections().await?;
        tracing::debug!(slot = %id, "notice removed");
        Ok(1)
    }

    /// Write a slot's fields; the message key goes last since it marks presence
    async fn persist(&self, slot: &Slot) -> Result<()> {
        let id = slot.id;
        self.store
            .set(&self.layout.field(id, SlotField::Type), slot.notice_type.as_str())
            .await?;
        let expires_key = self.layout.field(id, SlotField::Expires);
        match slot.expires_at {
            Some(ts) => self.store.set(&expires_key, &format_expiry(ts)).await?,
            None => {
                self.store.delete(&expires_key).await?;
            }
        }
        self.store.set(&self.layout.message(id), &slot.message).await
    }
}

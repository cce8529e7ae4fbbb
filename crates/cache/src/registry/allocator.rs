//! Gap-filling id allocation

use super::SlotRegistry;
use crate::aggregation::NextIdHint;
use noticeboard_core::{Error, Result, SlotId};

impl SlotRegistry {
    /// Lowest free indexed id, or `None` when every slot is in use
    ///
    /// Served from the cached hint while it is live, otherwise computed from
    /// the indexed-slot projection (one batched scan on a miss) and cached.
    /// The answer is advisory: `create` re-checks against the store under the
    /// allocation lock.
    pub async fn next_free_id(&self) -> Result<Option<SlotId>> {
        if let Some(hint) = self.aggregation.next_id_hint().await {
            tracing::debug!(?hint, "next-id hint served from cache");
            return Ok(hint.free_id());
        }
        let present = self.aggregation.indexed_slots().await?;
        let hint = NextIdHint::compute(present.keys(), self.config.max_slots);
        self.aggregation.store_next_id_hint(hint).await;
        Ok(hint.free_id())
    }

    /// Pick the lowest free id from a fresh scan; caller holds the allocation lock
    pub(super) async fn allocate_locked(&self) -> Result<SlotId> {
        let present = self.aggregation.load_indexed_slots().await?;
        match NextIdHint::compute(present.keys(), self.config.max_slots) {
            NextIdHint::Free(id) => Ok(id),
            NextIdHint::Exhausted => Err(Error::SlotsExhausted {
                max: self.config.max_slots,
            }),
        }
    }
}

//! Caller-facing facade over the matching, moderation, and policy
//! subsystems.
//!
//! [`BackOffice`] wires the clock, the external order/bid store, the
//! moderation queue, and the policy gate together and exposes the surface a
//! thin transport layer would call: `rank_bids`, `create_moderation_item`,
//! `claim`/`escalate`/`resolve`, and the lock operations. It owns no
//! business rules of its own beyond composition: the one cross-subsystem
//! behavior here is the lock-on-flag / unlock-on-resolve coupling between
//! the queue and the gate.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::WeftConfig;
use crate::errors::ServiceError;
use crate::matching::{RankedBid, rank_bids};
use crate::moderation::{
    ModerationItem, ModerationQueue, NewModerationItem, Outcome, QueueStats, SubjectType,
};
use crate::notify::Notifier;
use crate::policy::{ConversationLock, PolicyGate};
use crate::store::{BidStore, OrderStore};

/// Actor recorded on locks applied automatically at ingestion.
const INGESTION_ACTOR: &str = "system";

pub struct BackOffice {
    config: WeftConfig,
    clock: Arc<dyn Clock>,
    orders: Arc<dyn OrderStore>,
    bids: Arc<dyn BidStore>,
    queue: ModerationQueue,
    gate: PolicyGate,
}

impl BackOffice {
    pub fn new(
        config: WeftConfig,
        clock: Arc<dyn Clock>,
        orders: Arc<dyn OrderStore>,
        bids: Arc<dyn BidStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let queue = ModerationQueue::new(config.sla, notifier.clone());
        let gate = PolicyGate::new(Arc::new(queue.clone()), notifier);
        Self {
            config,
            clock,
            orders,
            bids,
            queue,
            gate,
        }
    }

    pub fn config(&self) -> &WeftConfig {
        &self.config
    }

    /// Current ranking of the bids competing for an order, best match
    /// first. Recomputed from store state on every call.
    pub fn rank_bids(&self, order_id: &str) -> Result<Vec<RankedBid>, ServiceError> {
        let order = self
            .orders
            .order(order_id)
            .ok_or_else(|| ServiceError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        let bids = self.bids.bids_for_order(order_id);
        Ok(rank_bids(&order, &bids, &self.config.scoring)?)
    }

    /// Ingestion entry point for flagged submissions.
    ///
    /// An order-subject item also locks the order's conversation, keeping
    /// the invariant that an order under active moderation cannot exchange
    /// direct messages. The lock is best-effort relative to item creation.
    pub fn create_moderation_item(
        &self,
        new: NewModerationItem,
    ) -> Result<ModerationItem, ServiceError> {
        let now = self.clock.now();
        let item = self.queue.create(new, now)?;

        if item.subject_type == SubjectType::Order {
            let reason = format!("under moderation: {}", item.flag_reason);
            if let Err(err) = self.gate.lock(
                &item.subject_id,
                &reason,
                INGESTION_ACTOR,
                Some(item.id),
                now,
            ) {
                warn!(item_id = %item.id, order_id = %item.subject_id, %err,
                    "failed to lock conversation for flagged order");
            }
        }
        Ok(item)
    }

    pub fn moderation_item(&self, item_id: Uuid) -> Result<ModerationItem, ServiceError> {
        Ok(self.queue.item(item_id)?)
    }

    pub fn claim(&self, item_id: Uuid, moderator: &str) -> Result<ModerationItem, ServiceError> {
        Ok(self.queue.claim(item_id, moderator, self.clock.now())?)
    }

    pub fn escalate(&self, item_id: Uuid, reason: &str) -> Result<ModerationItem, ServiceError> {
        Ok(self.queue.escalate(item_id, reason, self.clock.now())?)
    }

    /// Resolve a moderation item and apply its policy side effects.
    ///
    /// A rejected vendor profile, or an order whose conversation was locked
    /// by this very item, triggers a best-effort unlock attempt: failures
    /// (typically another item still open on the same order) are logged and
    /// never propagated as a queue failure.
    pub fn resolve(
        &self,
        item_id: Uuid,
        outcome: Outcome,
        moderator: &str,
    ) -> Result<ModerationItem, ServiceError> {
        let now = self.clock.now();
        let item = self.queue.resolve(item_id, outcome, moderator, now)?;

        let should_unlock = match item.subject_type {
            SubjectType::VendorProfile => outcome == Outcome::Rejected,
            SubjectType::Order => self
                .gate
                .lock_state(&item.subject_id)
                .is_some_and(|lock| lock.locked && lock.source_item == Some(item.id)),
        };
        if should_unlock {
            if let Err(err) = self.gate.unlock(&item.subject_id, moderator, now) {
                warn!(item_id = %item.id, subject_id = %item.subject_id, %err,
                    "post-resolution unlock attempt failed");
            }
        }
        Ok(item)
    }

    /// The active moderation queue in processing order.
    pub fn moderation_queue(&self) -> Result<Vec<ModerationItem>, ServiceError> {
        Ok(self.queue.active_ranking(self.clock.now())?)
    }

    /// Queue counters for the back-office overview.
    pub fn queue_stats(&self) -> Result<QueueStats, ServiceError> {
        Ok(self.queue.stats(self.clock.now())?)
    }

    /// Persist escalation for items past their SLA deadline. Intended to be
    /// called from the host's scheduler.
    pub fn sweep(&self) -> Result<Vec<Uuid>, ServiceError> {
        Ok(self.queue.sweep(self.clock.now())?)
    }

    pub fn is_locked(&self, order_id: &str) -> bool {
        self.gate.is_locked(order_id)
    }

    pub fn lock_state(&self, order_id: &str) -> Option<ConversationLock> {
        self.gate.lock_state(order_id)
    }

    /// Manually lock an order's conversation.
    pub fn lock(
        &self,
        order_id: &str,
        reason: &str,
        actor: &str,
    ) -> Result<ConversationLock, ServiceError> {
        Ok(self.gate.lock(order_id, reason, actor, None, self.clock.now())?)
    }

    /// Unlock an order's conversation; refused while moderation is open.
    pub fn unlock(&self, order_id: &str, actor: &str) -> Result<ConversationLock, ServiceError> {
        Ok(self.gate.unlock(order_id, actor, self.clock.now())?)
    }

    /// Dispatch-boundary check for an outbound message on an order's
    /// conversation.
    pub fn allow_message(&self, order_id: &str) -> bool {
        self.gate.allow_message(order_id, self.clock.now())
    }
}

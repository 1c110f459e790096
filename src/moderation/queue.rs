//! The moderation work queue: creation, claim/escalate/resolve transitions,
//! and the priority/SLA-ordered active ranking.
//!
//! The queue owns the only mutable moderation state in the core. All
//! transitions for one item are applied atomically with respect to
//! concurrent callers — two moderators racing to claim cannot both succeed,
//! and a racing resolve/escalate pair leaves the item in exactly one of the
//! two outcomes. A rejected transition leaves the item untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SlaConfig;
use crate::errors::ModerationError;
use crate::moderation::{
    ModerationItem, ModerationState, NewModerationItem, Outcome, Resolution, SubjectType,
};
use crate::notify::{Event, EventKind, Notifier, dispatch};
use crate::policy::ModerationLookup;

/// Point-in-time counts over the queue, computed on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Non-resolved items.
    pub total_active: usize,
    pub pending: usize,
    /// Claimed and under review.
    pub in_review: usize,
    /// Escalated, including breached items not yet swept.
    pub escalated: usize,
    /// Active items past their SLA deadline.
    pub breached: usize,
    pub resolved: usize,
}

/// Cloneable handle to the moderation queue.
///
/// Internally an `Arc<Mutex<_>>` over the item map; every transition runs
/// under the lock, which gives the per-item atomicity the claim/resolve
/// races require.
#[derive(Clone)]
pub struct ModerationQueue {
    inner: Arc<Mutex<HashMap<Uuid, ModerationItem>>>,
    sla: SlaConfig,
    notifier: Arc<dyn Notifier>,
}

impl ModerationQueue {
    pub fn new(sla: SlaConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            sla,
            notifier,
        }
    }

    fn items(&self) -> Result<MutexGuard<'_, HashMap<Uuid, ModerationItem>>, ModerationError> {
        self.inner.lock().map_err(|_| ModerationError::StorePoisoned)
    }

    /// Ingestion entry point: admit a flagged submission into the queue.
    ///
    /// The SLA deadline is fixed here from the priority table and never
    /// changes afterwards.
    pub fn create(
        &self,
        new: NewModerationItem,
        now: DateTime<Utc>,
    ) -> Result<ModerationItem, ModerationError> {
        let item = ModerationItem::create(new, now, &self.sla);
        let snapshot = item.clone();
        self.items()?.insert(item.id, item);

        info!(
            item_id = %snapshot.id,
            subject = %snapshot.subject_id,
            priority = snapshot.priority.as_str(),
            "moderation item created"
        );
        dispatch(
            self.notifier.as_ref(),
            Event::new(
                EventKind::ModerationCreated,
                snapshot.id.to_string(),
                now,
                serde_json::json!({
                    "subject_type": snapshot.subject_type.as_str(),
                    "subject_id": snapshot.subject_id,
                    "priority": snapshot.priority.as_str(),
                }),
            ),
        );
        Ok(snapshot)
    }

    /// Fetch one item by id.
    pub fn item(&self, item_id: Uuid) -> Result<ModerationItem, ModerationError> {
        self.items()?
            .get(&item_id)
            .cloned()
            .ok_or(ModerationError::ItemNotFound { item_id })
    }

    /// Claim an item for review.
    ///
    /// Re-claiming by the same moderator is an idempotent success; a
    /// different moderator gets `AlreadyClaimed`. Claiming an escalated
    /// item records the claimant without leaving `escalated`.
    pub fn claim(
        &self,
        item_id: Uuid,
        moderator: &str,
        now: DateTime<Utc>,
    ) -> Result<ModerationItem, ModerationError> {
        let mut items = self.items()?;
        let item = items
            .get_mut(&item_id)
            .ok_or(ModerationError::ItemNotFound { item_id })?;

        if item.state.is_terminal() {
            return Err(ModerationError::AlreadyResolved { item_id });
        }
        if let Some(claimant) = &item.claimant {
            if claimant != moderator {
                return Err(ModerationError::AlreadyClaimed {
                    item_id,
                    claimant: claimant.clone(),
                });
            }
            return Ok(item.clone());
        }

        item.claimant = Some(moderator.to_string());
        if item.state == ModerationState::Pending {
            item.state = ModerationState::Claimed;
        }
        let snapshot = item.clone();
        drop(items);

        debug!(item_id = %item_id, moderator, "moderation item claimed");
        dispatch(
            self.notifier.as_ref(),
            Event::new(
                EventKind::ModerationClaimed,
                item_id.to_string(),
                now,
                serde_json::json!({ "moderator": moderator }),
            ),
        );
        Ok(snapshot)
    }

    /// Manually escalate an item.
    ///
    /// Allowed from `pending` or `claimed`; the claimant, if any, is kept.
    /// Escalating an already-escalated item is a no-op success.
    pub fn escalate(
        &self,
        item_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<ModerationItem, ModerationError> {
        let mut items = self.items()?;
        let item = items
            .get_mut(&item_id)
            .ok_or(ModerationError::ItemNotFound { item_id })?;

        if item.state.is_terminal() {
            return Err(ModerationError::AlreadyResolved { item_id });
        }
        if item.state == ModerationState::Escalated {
            return Ok(item.clone());
        }

        item.state = ModerationState::Escalated;
        item.escalation_reason = Some(reason.to_string());
        let snapshot = item.clone();
        drop(items);

        info!(item_id = %item_id, reason, "moderation item escalated");
        dispatch(
            self.notifier.as_ref(),
            Event::new(
                EventKind::ModerationEscalated,
                item_id.to_string(),
                now,
                serde_json::json!({ "reason": reason }),
            ),
        );
        Ok(snapshot)
    }

    /// Persist escalation for every active item past its SLA deadline.
    ///
    /// Breach already shows up in rankings without this (effective state is
    /// computed on read); sweeping makes it durable and emits events. Hosts
    /// call this from whatever scheduler they run.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, ModerationError> {
        let mut escalated = Vec::new();
        {
            let mut items = self.items()?;
            for item in items.values_mut() {
                if item.state != ModerationState::Escalated && item.is_breached(now) {
                    item.state = ModerationState::Escalated;
                    item.escalation_reason
                        .get_or_insert_with(|| "sla deadline breached".to_string());
                    escalated.push(item.id);
                }
            }
        }

        for id in &escalated {
            info!(item_id = %id, "moderation item auto-escalated on sla breach");
            dispatch(
                self.notifier.as_ref(),
                Event::new(
                    EventKind::ModerationEscalated,
                    id.to_string(),
                    now,
                    serde_json::json!({ "reason": "sla deadline breached" }),
                ),
            );
        }
        Ok(escalated)
    }

    /// Resolve a claimed item with an outcome.
    ///
    /// Requires a prior claim (`NotClaimed` otherwise) and a non-terminal
    /// state (`AlreadyResolved` otherwise). Policy-gate side effects of a
    /// resolution are the composing service's concern; the queue only
    /// records the terminal state.
    pub fn resolve(
        &self,
        item_id: Uuid,
        outcome: Outcome,
        moderator: &str,
        now: DateTime<Utc>,
    ) -> Result<ModerationItem, ModerationError> {
        let mut items = self.items()?;
        let item = items
            .get_mut(&item_id)
            .ok_or(ModerationError::ItemNotFound { item_id })?;

        if item.state.is_terminal() {
            return Err(ModerationError::AlreadyResolved { item_id });
        }
        if item.claimant.is_none() {
            return Err(ModerationError::NotClaimed { item_id });
        }

        item.state = ModerationState::Resolved;
        item.resolution = Some(Resolution {
            outcome,
            resolver: moderator.to_string(),
            resolved_at: now,
        });
        let snapshot = item.clone();
        drop(items);

        info!(item_id = %item_id, outcome = ?outcome, moderator, "moderation item resolved");
        dispatch(
            self.notifier.as_ref(),
            Event::new(
                EventKind::ModerationResolved,
                item_id.to_string(),
                now,
                serde_json::json!({
                    "outcome": match outcome {
                        Outcome::Approved => "approved",
                        Outcome::Rejected => "rejected",
                    },
                    "moderator": moderator,
                }),
            ),
        );
        Ok(snapshot)
    }

    /// The active queue in processing order: escalated items first (breached
    /// items count as escalated), then pending, then claimed; within each
    /// group, soonest-breaching first. Resolved items are excluded.
    pub fn active_ranking(&self, now: DateTime<Utc>) -> Result<Vec<ModerationItem>, ModerationError> {
        let mut active: Vec<ModerationItem> = self
            .items()?
            .values()
            .filter(|item| !item.state.is_terminal())
            .cloned()
            .collect();

        active.sort_by(|a, b| {
            group_rank(a.effective_state(now))
                .cmp(&group_rank(b.effective_state(now)))
                .then_with(|| a.sla_deadline.cmp(&b.sla_deadline))
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(active)
    }

    /// Queue counters for the back-office overview, computed on read.
    pub fn stats(&self, now: DateTime<Utc>) -> Result<QueueStats, ModerationError> {
        let items = self.items()?;
        let mut stats = QueueStats::default();
        for item in items.values() {
            match item.effective_state(now) {
                ModerationState::Resolved => stats.resolved += 1,
                state => {
                    stats.total_active += 1;
                    if item.is_breached(now) {
                        stats.breached += 1;
                    }
                    match state {
                        ModerationState::Pending => stats.pending += 1,
                        ModerationState::Claimed => stats.in_review += 1,
                        ModerationState::Escalated => stats.escalated += 1,
                        ModerationState::Resolved => unreachable!(),
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Count of unresolved items referencing an order. Consulted by the
    /// policy gate before permitting an unlock.
    pub fn open_items_for_order(&self, order_id: &str) -> usize {
        self.inner
            .lock()
            .map(|items| {
                items
                    .values()
                    .filter(|item| {
                        !item.state.is_terminal()
                            && item.subject_type == SubjectType::Order
                            && item.subject_id == order_id
                    })
                    .count()
            })
            .unwrap_or(0)
    }
}

impl ModerationLookup for ModerationQueue {
    fn open_items_for(&self, order_id: &str) -> usize {
        self.open_items_for_order(order_id)
    }
}

fn group_rank(state: ModerationState) -> u8 {
    match state {
        ModerationState::Escalated => 0,
        ModerationState::Pending => 1,
        ModerationState::Claimed => 2,
        // Excluded from the active ranking before sorting.
        ModerationState::Resolved => 3,
    }
}

//! Contact-lock policy gate.
//!
//! Single source of truth for whether direct messaging is permitted on an
//! order's conversation. The gate holds one lock record per order; locking
//! is an idempotent upsert, unlocking is refused while any unresolved
//! moderation item references the order. Message transport lives outside
//! this core — the dispatch boundary consults [`PolicyGate::is_locked`] (or
//! [`PolicyGate::allow_message`]) before accepting content.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::PolicyError;
use crate::notify::{Event, EventKind, Notifier, dispatch};

/// Moderation visibility the gate needs before permitting an unlock.
///
/// Implemented by the moderation queue; kept as a trait so the gate has no
/// dependency on queue internals.
pub trait ModerationLookup: Send + Sync {
    /// Unresolved moderation items referencing this order.
    fn open_items_for(&self, order_id: &str) -> usize;
}

/// Lock record for one order's conversation. Exactly one per order; absence
/// means unlocked (the default at order creation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLock {
    pub order_id: String,
    pub locked: bool,
    /// Why the conversation was locked; cleared on unlock.
    pub reason: Option<String>,
    /// Who performed the last transition.
    pub actor: String,
    pub updated_at: DateTime<Utc>,
    /// Moderation item that caused the lock, when one did.
    pub source_item: Option<Uuid>,
}

/// Cloneable handle to the contact-lock gate.
#[derive(Clone)]
pub struct PolicyGate {
    locks: Arc<Mutex<HashMap<String, ConversationLock>>>,
    moderation: Arc<dyn ModerationLookup>,
    notifier: Arc<dyn Notifier>,
}

impl PolicyGate {
    pub fn new(moderation: Arc<dyn ModerationLookup>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
            moderation,
            notifier,
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, ConversationLock>>, PolicyError> {
        self.locks.lock().map_err(|_| PolicyError::StorePoisoned)
    }

    /// Whether messaging on this order's conversation is currently blocked.
    ///
    /// Fails closed: if the lock store is unreadable the conversation
    /// reports as locked.
    pub fn is_locked(&self, order_id: &str) -> bool {
        match self.locks.lock() {
            Ok(locks) => locks.get(order_id).is_some_and(|lock| lock.locked),
            Err(_) => true,
        }
    }

    /// Current lock record, if any transition ever touched this order.
    pub fn lock_state(&self, order_id: &str) -> Option<ConversationLock> {
        self.locks
            .lock()
            .ok()
            .and_then(|locks| locks.get(order_id).cloned())
    }

    /// Lock an order's conversation.
    ///
    /// Idempotent: re-locking refreshes reason, actor, timestamp, and
    /// source item without error.
    pub fn lock(
        &self,
        order_id: &str,
        reason: &str,
        actor: &str,
        source_item: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<ConversationLock, PolicyError> {
        let lock = ConversationLock {
            order_id: order_id.to_string(),
            locked: true,
            reason: Some(reason.to_string()),
            actor: actor.to_string(),
            updated_at: now,
            source_item,
        };
        self.guard()?.insert(order_id.to_string(), lock.clone());

        info!(order_id, actor, reason, "conversation locked");
        dispatch(
            self.notifier.as_ref(),
            Event::new(
                EventKind::ConversationLocked,
                order_id,
                now,
                serde_json::json!({ "reason": reason, "actor": actor }),
            ),
        );
        Ok(lock)
    }

    /// Unlock an order's conversation.
    ///
    /// Refused with `BlockedByOpenModeration` while any unresolved
    /// moderation item references the order; no partial unlock occurs.
    /// Unlocking an already-unlocked conversation succeeds and refreshes
    /// the audit fields.
    pub fn unlock(
        &self,
        order_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<ConversationLock, PolicyError> {
        let open_items = self.moderation.open_items_for(order_id);
        if open_items > 0 {
            return Err(PolicyError::BlockedByOpenModeration {
                order_id: order_id.to_string(),
                open_items,
            });
        }

        let lock = ConversationLock {
            order_id: order_id.to_string(),
            locked: false,
            reason: None,
            actor: actor.to_string(),
            updated_at: now,
            source_item: None,
        };
        self.guard()?.insert(order_id.to_string(), lock.clone());

        info!(order_id, actor, "conversation unlocked");
        dispatch(
            self.notifier.as_ref(),
            Event::new(
                EventKind::ConversationUnlocked,
                order_id,
                now,
                serde_json::json!({ "actor": actor }),
            ),
        );
        Ok(lock)
    }

    /// Dispatch-boundary check for an outbound message.
    ///
    /// Returns whether the send may proceed; a refusal emits a
    /// `message_blocked` event so the sender can be notified.
    pub fn allow_message(&self, order_id: &str, now: DateTime<Utc>) -> bool {
        if !self.is_locked(order_id) {
            return true;
        }
        dispatch(
            self.notifier.as_ref(),
            Event::new(
                EventKind::MessageBlocked,
                order_id,
                now,
                serde_json::json!({ "reason": "contacts locked" }),
            ),
        );
        false
    }
}

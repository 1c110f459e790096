//! Outbound event sink for queue and gate transitions.
//!
//! Every lock/unlock and every moderation state transition is reported to a
//! [`Notifier`]. Delivery is fire-and-forget: a sink failure is logged and
//! never turns a successful transition into a reported failure.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Kinds of events the core emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ModerationCreated,
    ModerationClaimed,
    ModerationEscalated,
    ModerationResolved,
    ConversationLocked,
    ConversationUnlocked,
    MessageBlocked,
}

/// A single outbound event: what happened, to which subject, when, and any
/// free-form detail the sink may want to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub subject_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl Event {
    pub fn new(
        kind: EventKind,
        subject_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
            timestamp,
            detail,
        }
    }
}

/// Failure reported by a notifier sink.
#[derive(Debug, Error)]
#[error("notifier sink failed: {0}")]
pub struct NotifyError(pub String);

/// External notification collaborator.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: Event) -> Result<(), NotifyError>;
}

/// Deliver an event, logging (never propagating) sink failures.
pub(crate) fn dispatch(notifier: &dyn Notifier, event: Event) {
    let kind = event.kind;
    let subject = event.subject_id.clone();
    if let Err(err) = notifier.notify(event) {
        warn!(?kind, subject, %err, "notifier dispatch failed");
    }
}

/// Discards every event. Useful when no sink is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Collects events in memory. Used by tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<Event>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Drain and return everything received so far.
    pub fn take(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, event: Event) -> Result<(), NotifyError> {
        self.events
            .lock()
            .map_err(|_| NotifyError("event buffer poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_records_in_order() {
        let notifier = MemoryNotifier::new();
        let now = Utc::now();
        notifier
            .notify(Event::new(
                EventKind::ConversationLocked,
                "ORD-1",
                now,
                serde_json::json!({"reason": "flagged"}),
            ))
            .unwrap();
        notifier
            .notify(Event::new(
                EventKind::ConversationUnlocked,
                "ORD-1",
                now,
                serde_json::Value::Null,
            ))
            .unwrap();

        let events = notifier.take();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::ConversationLocked);
        assert_eq!(events[1].kind, EventKind::ConversationUnlocked);
        assert!(notifier.events().is_empty());
    }

    #[test]
    fn test_event_serializes_snake_case() {
        let event = Event::new(
            EventKind::ModerationEscalated,
            "ORD-2",
            Utc::now(),
            serde_json::Value::Null,
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("moderation_escalated"));
    }
}

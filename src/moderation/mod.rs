//! Moderation of flagged submissions: the work item, its state machine, and
//! SLA arithmetic.
//!
//! States walk `pending -> (claimed | escalated) -> resolved`; `resolved` is
//! terminal. Escalation is reachable from `pending` or `claimed`, either
//! manually or because the SLA deadline passed. Breach detection is a pure
//! function of `(state, sla_deadline, now)` — there is no background timer
//! in this core; hosts wanting periodic enforcement wrap
//! [`queue::ModerationQueue::sweep`] in their own scheduler.

pub mod queue;

pub use queue::{ModerationQueue, QueueStats};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{SlaConfig, SlaDisplayConfig};
use crate::models::Priority;

/// What kind of submission was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Order,
    VendorProfile,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::VendorProfile => "vendor_profile",
        }
    }
}

/// Where the flag came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagOrigin {
    /// Raised by an automated rule at ingestion.
    Automated,
    /// Raised by a human report.
    Manual,
}

/// Moderation item state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationState {
    Pending,
    Claimed,
    Escalated,
    Resolved,
}

impl ModerationState {
    /// Resolved items accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Approved,
    Rejected,
}

/// Record of who resolved an item, how, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: Outcome,
    pub resolver: String,
    pub resolved_at: DateTime<Utc>,
}

/// SLA health band computed at read time from the absolute deadline.
///
/// Remaining time is always derived from the stored deadline, never
/// reconstructed from a formatted countdown string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaHealth {
    Breached,
    Critical,
    Warning,
    Healthy,
}

/// Ingestion payload for a new moderation item. The single creation path —
/// items are never spontaneously generated inside the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewModerationItem {
    pub subject_type: SubjectType,
    pub subject_id: String,
    pub priority: Priority,
    pub flag_reason: String,
    pub origin: FlagOrigin,
}

/// A flagged submission awaiting human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationItem {
    pub id: Uuid,
    pub subject_type: SubjectType,
    pub subject_id: String,
    /// Priority assigned at ingestion. Escalation does not rewrite this;
    /// see [`ModerationItem::effective_priority`].
    pub priority: Priority,
    pub flag_reason: String,
    pub origin: FlagOrigin,
    pub state: ModerationState,
    pub created_at: DateTime<Utc>,
    /// Absolute breach deadline, fixed at creation.
    pub sla_deadline: DateTime<Utc>,
    pub claimant: Option<String>,
    pub escalation_reason: Option<String>,
    pub resolution: Option<Resolution>,
}

impl ModerationItem {
    pub(crate) fn create(new: NewModerationItem, now: DateTime<Utc>, sla: &SlaConfig) -> Self {
        let sla_deadline = now + sla.duration_for(new.priority);
        Self {
            id: Uuid::new_v4(),
            subject_type: new.subject_type,
            subject_id: new.subject_id,
            priority: new.priority,
            flag_reason: new.flag_reason,
            origin: new.origin,
            state: ModerationState::Pending,
            created_at: now,
            sla_deadline,
            claimant: None,
            escalation_reason: None,
            resolution: None,
        }
    }

    /// True once the deadline has passed on a non-resolved item.
    pub fn is_breached(&self, now: DateTime<Utc>) -> bool {
        !self.state.is_terminal() && now > self.sla_deadline
    }

    /// State for ranking purposes: a breached item reads as escalated even
    /// before a sweep persists the transition.
    pub fn effective_state(&self, now: DateTime<Utc>) -> ModerationState {
        if self.state.is_terminal() {
            ModerationState::Resolved
        } else if self.state == ModerationState::Escalated || self.is_breached(now) {
            ModerationState::Escalated
        } else {
            self.state
        }
    }

    /// Priority as it should be reported: escalation forces `high`.
    pub fn effective_priority(&self, now: DateTime<Utc>) -> Priority {
        if self.effective_state(now) == ModerationState::Escalated {
            Priority::High
        } else {
            self.priority
        }
    }

    /// Time left before breach; negative once breached.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        self.sla_deadline - now
    }

    /// Display urgency band for the remaining time.
    pub fn sla_health(&self, now: DateTime<Utc>, display: &SlaDisplayConfig) -> SlaHealth {
        let remaining = self.time_remaining(now);
        if remaining <= Duration::zero() {
            SlaHealth::Breached
        } else if remaining < display.critical_within {
            SlaHealth::Critical
        } else if remaining < display.warning_within {
            SlaHealth::Warning
        } else {
            SlaHealth::Healthy
        }
    }
}

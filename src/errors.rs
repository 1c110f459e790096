//! Typed error hierarchy for the weft core.
//!
//! Three enums cover the three subsystems:
//! - `ScoringError` — invalid input to the bid scoring engine
//! - `ModerationError` — rejected moderation queue transitions
//! - `PolicyError` — contact-lock gate refusals
//!
//! `ServiceError` wraps all three for the caller-facing facade. A failed
//! transition never leaves partial state behind; the error is the whole
//! outcome of the call.

use thiserror::Error;
use uuid::Uuid;

/// Errors from the bid scoring engine.
///
/// Degenerate input is surfaced, never silently scored as zero.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid bid {bid_id}: {reason}")]
    InvalidBid { bid_id: String, reason: String },
}

/// Errors from moderation queue transitions.
///
/// Each variant corresponds to a rejected transition; queue state is
/// unchanged when one of these is returned.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("item {item_id} is already claimed by {claimant}")]
    AlreadyClaimed { item_id: Uuid, claimant: String },

    #[error("item {item_id} has no claimant; resolution requires a prior claim")]
    NotClaimed { item_id: Uuid },

    #[error("item {item_id} is already resolved")]
    AlreadyResolved { item_id: Uuid },

    #[error("moderation item {item_id} not found")]
    ItemNotFound { item_id: Uuid },

    #[error("moderation store lock poisoned")]
    StorePoisoned,
}

/// Errors from the contact-lock policy gate.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("order {order_id} has {open_items} unresolved moderation item(s); unlock refused")]
    BlockedByOpenModeration { order_id: String, open_items: usize },

    #[error("lock store lock poisoned")]
    StorePoisoned,
}

/// Errors surfaced by the caller-facing service facade.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("order {order_id} not found")]
    OrderNotFound { order_id: String },

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Moderation(#[from] ModerationError),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

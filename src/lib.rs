//! Weft: marketplace back-office core.
//!
//! Three cooperating subsystems behind one thin facade:
//! - `moderation` — a priority/SLA-ordered work queue of flagged orders and
//!   vendor profiles, with claim/escalate/resolve transitions
//! - `matching` — deterministic scoring and ranking of vendor bids against
//!   an order's requirements
//! - `policy` — the contact-lock gate deciding when two marketplace parties
//!   may exchange direct messages on an order
//!
//! Rendering, transport, persistence, and authentication live outside this
//! crate; they supply data through the `store` traits and receive decisions
//! and `notify` events back.

pub mod clock;
pub mod config;
pub mod errors;
pub mod matching;
pub mod models;
pub mod moderation;
pub mod notify;
pub mod policy;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ScoreWeights, ScoringConfig, SlaConfig, SlaDisplayConfig, WeftConfig};
pub use errors::{ModerationError, PolicyError, ScoringError, ServiceError};
pub use matching::{MatchScore, RankedBid, ScoreBand, rank_bids, score_bid};
pub use models::{Bid, Order, OrderStatus, Priority};
pub use moderation::{
    FlagOrigin, ModerationItem, ModerationQueue, ModerationState, NewModerationItem, Outcome,
    QueueStats, Resolution, SlaHealth, SubjectType,
};
pub use notify::{Event, EventKind, MemoryNotifier, Notifier, NullNotifier};
pub use policy::{ConversationLock, ModerationLookup, PolicyGate};
pub use service::BackOffice;
pub use store::{BidStore, MemoryStore, OrderStore};

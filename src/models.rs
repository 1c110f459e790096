//! Domain records shared across the matching, moderation, and policy modules.
//!
//! Orders, vendors, and users live in an external store; the core only reads
//! the attributes it needs for scoring and gating. Everything here is a plain
//! data record — the state machines that act on these records live in
//! `moderation` and `policy`.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a marketplace order.
///
/// Exhaustive by construction — every consumer matches on all variants
/// rather than falling through a string-keyed default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Review,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

/// Review priority for flagged submissions.
///
/// Ordered: `Low < Medium < High`, so `max` picks the more urgent of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// A client order as seen by this core: the requirement attributes that
/// drive bid scoring, plus status and creation time.
///
/// Money is carried in minor units (cents) so scoring arithmetic is exact
/// and ordering is total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Display identifier, e.g. "ORD-1240".
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    /// Budget ceiling in cents.
    pub budget_ceiling_cents: u64,
    /// Hard deadline for delivery.
    pub deadline: DateTime<Utc>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A vendor's proposal for one order.
///
/// Vendor attributes are denormalized onto the bid at submission time; a
/// score computed from a bid is therefore a pure function of the bid and
/// the order, independent of later vendor profile edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    /// Display identifier, e.g. "BID-3301".
    pub id: String,
    pub order_id: String,
    pub vendor_id: String,
    /// Quoted price in cents.
    pub price_cents: u64,
    /// Time the vendor needs to deliver.
    #[serde(with = "duration_serde")]
    pub lead_time: Duration,
    /// Vendor's historical rating, 0.0–5.0.
    pub vendor_rating: f64,
    pub vendor_verified: bool,
    /// Completed projects on the vendor's profile.
    pub vendor_completed_projects: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Serde helpers for chrono Duration serialization (whole seconds).
pub(crate) mod duration_serde {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.num_seconds().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = i64::deserialize(deserializer)?;
        Ok(Duration::seconds(secs))
    }
}

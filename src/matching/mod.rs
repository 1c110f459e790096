//! Bid matching: deterministic scoring of vendor bids against an order's
//! requirements.
//!
//! A [`MatchScore`] is a weighted composite in [0, 100] with four named
//! sub-scores (price, timeline, experience, quality). It is a pure function
//! of `(Bid, Order, ScoringConfig)`: no randomness, no wall-clock reads —
//! the timeline sub-score works from the order's stored deadline and the
//! bid's submission time, so a score recomputed later for audit is
//! bit-identical to the original.

pub mod ranker;

pub use ranker::{RankedBid, rank_bids};

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::errors::ScoringError;
use crate::models::{Bid, Order};

/// Qualitative band for a composite score, mirroring how the back office
/// surfaces match strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// 90 and above.
    Excellent,
    /// 80–89.
    Strong,
    /// 60–79.
    Fair,
    /// Below 60.
    Weak,
}

/// Composite match score plus its four sub-scores.
///
/// Never stored as a source of truth; always recomputable from the bid and
/// order it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Weighted composite, 0–100.
    pub composite: u8,
    pub price: u8,
    pub timeline: u8,
    pub experience: u8,
    pub quality: u8,
}

impl MatchScore {
    pub fn band(&self) -> ScoreBand {
        match self.composite {
            90..=100 => ScoreBand::Excellent,
            80..=89 => ScoreBand::Strong,
            60..=79 => ScoreBand::Fair,
            _ => ScoreBand::Weak,
        }
    }
}

/// Score one bid against one order.
///
/// Degenerate input (zero price, rating outside 0–5, non-positive lead
/// time, order with no budget) is an error, never a silent zero.
pub fn score_bid(bid: &Bid, order: &Order, config: &ScoringConfig) -> Result<MatchScore, ScoringError> {
    validate(bid, order)?;

    let price = price_subscore(bid.price_cents, order.budget_ceiling_cents);
    let timeline = timeline_subscore(bid, order);
    let experience = experience_subscore(bid.vendor_completed_projects, config.experience_ceiling);
    let quality = quality_subscore(bid.vendor_rating, bid.vendor_verified, config.verified_bonus);

    let weights = &config.weights;
    let composite = (price * weights.price as f64
        + timeline * weights.timeline as f64
        + experience * weights.experience as f64
        + quality * weights.quality as f64)
        / 100.0;

    Ok(MatchScore {
        composite: clamp_round(composite),
        price: clamp_round(price),
        timeline: clamp_round(timeline),
        experience: clamp_round(experience),
        quality: clamp_round(quality),
    })
}

fn validate(bid: &Bid, order: &Order) -> Result<(), ScoringError> {
    let invalid = |reason: &str| ScoringError::InvalidBid {
        bid_id: bid.id.clone(),
        reason: reason.to_string(),
    };

    if bid.price_cents == 0 {
        return Err(invalid("zero price"));
    }
    if bid.lead_time <= chrono::Duration::zero() {
        return Err(invalid("non-positive lead time"));
    }
    if !bid.vendor_rating.is_finite() || !(0.0..=5.0).contains(&bid.vendor_rating) {
        return Err(invalid("vendor rating outside 0-5"));
    }
    if order.budget_ceiling_cents == 0 {
        return Err(invalid("order has no budget ceiling"));
    }
    Ok(())
}

/// `100 * min(1, ceiling / price)`: at or under budget scores 100, twice
/// over budget scores 50.
fn price_subscore(price_cents: u64, ceiling_cents: u64) -> f64 {
    let ratio = ceiling_cents as f64 / price_cents as f64;
    100.0 * ratio.min(1.0)
}

/// Linear between 100 (lead time at or under half the window) and 0 (lead
/// time at or past the window). The window is the time between the bid's
/// submission and the order's deadline; a bid that cannot complete before
/// the deadline scores 0, never negative.
fn timeline_subscore(bid: &Bid, order: &Order) -> f64 {
    let window = order.deadline - bid.submitted_at;
    if window <= chrono::Duration::zero() {
        return 0.0;
    }
    let ratio = bid.lead_time.num_seconds() as f64 / window.num_seconds() as f64;
    if ratio <= 0.5 {
        100.0
    } else if ratio >= 1.0 {
        0.0
    } else {
        200.0 * (1.0 - ratio)
    }
}

/// Monotonic in completed-project count, saturating at the configured
/// ceiling.
fn experience_subscore(completed: u32, ceiling: u32) -> f64 {
    let ceiling = ceiling.max(1);
    100.0 * (completed.min(ceiling) as f64 / ceiling as f64)
}

/// `rating / 5 * 100`, with a verified bonus capped at 100.
fn quality_subscore(rating: f64, verified: bool, bonus: f64) -> f64 {
    let base = rating / 5.0 * 100.0;
    let with_bonus = if verified { base + bonus } else { base };
    with_bonus.min(100.0)
}

fn clamp_round(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

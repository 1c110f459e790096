//! Total ordering over the bids competing for one order.
//!
//! Scores are recomputed on every call from current bid/order state rather
//! than cached, so a ranking never reflects stale requirements. Callers
//! needing stability across a session snapshot the returned sequence.

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::errors::ScoringError;
use crate::matching::{MatchScore, score_bid};
use crate::models::{Bid, Order};

/// One entry in a ranking: the bid and the score it earned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedBid {
    pub bid: Bid,
    pub score: MatchScore,
}

/// Rank `bids` against `order`, best match first.
///
/// Ordering is fully deterministic: descending composite score, then
/// earlier submission, then lower price, then bid identifier. An order with
/// zero bids yields an empty ranking; a single invalid bid fails the whole
/// call rather than being silently dropped.
pub fn rank_bids(
    order: &Order,
    bids: &[Bid],
    config: &ScoringConfig,
) -> Result<Vec<RankedBid>, ScoringError> {
    let mut ranked = bids
        .iter()
        .map(|bid| {
            score_bid(bid, order, config).map(|score| RankedBid {
                bid: bid.clone(),
                score,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    ranked.sort_by(|a, b| {
        b.score
            .composite
            .cmp(&a.score.composite)
            .then_with(|| a.bid.submitted_at.cmp(&b.bid.submitted_at))
            .then_with(|| a.bid.price_cents.cmp(&b.bid.price_cents))
            .then_with(|| a.bid.id.cmp(&b.bid.id))
    });

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::models::OrderStatus;

    fn order() -> Order {
        Order {
            id: "ORD-1240".to_string(),
            title: "Custom textile manufacturing".to_string(),
            category: "Custom Textile".to_string(),
            description: "Large-scale run".to_string(),
            budget_ceiling_cents: 250_000,
            deadline: Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap(),
            status: OrderStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 11, 25, 0, 0, 0).unwrap(),
        }
    }

    fn bid(id: &str, price_cents: u64, minutes_after: i64) -> Bid {
        Bid {
            id: id.to_string(),
            order_id: "ORD-1240".to_string(),
            vendor_id: format!("VEN-{id}"),
            price_cents,
            lead_time: Duration::days(10),
            vendor_rating: 4.5,
            vendor_verified: false,
            vendor_completed_projects: 25,
            submitted_at: Utc.with_ymd_and_hms(2024, 11, 25, 0, 0, 0).unwrap()
                + Duration::minutes(minutes_after),
        }
    }

    #[test]
    fn test_empty_ranking_is_not_an_error() {
        let ranked = rank_bids(&order(), &[], &ScoringConfig::default()).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_sorted_descending_by_composite() {
        let o = order();
        let bids = vec![
            bid("BID-A", 500_000, 0), // over budget, lower score
            bid("BID-B", 250_000, 0), // at budget
        ];
        let ranked = rank_bids(&o, &bids, &ScoringConfig::default()).unwrap();
        assert_eq!(ranked[0].bid.id, "BID-B");
        assert!(ranked[0].score.composite >= ranked[1].score.composite);
    }

    #[test]
    fn test_equal_scores_earlier_submission_wins() {
        let o = order();
        let bids = vec![bid("BID-LATE", 250_000, 20), bid("BID-EARLY", 250_000, 10)];
        let ranked = rank_bids(&o, &bids, &ScoringConfig::default()).unwrap();
        assert_eq!(ranked[0].score.composite, ranked[1].score.composite);
        assert_eq!(ranked[0].bid.id, "BID-EARLY");
    }

    #[test]
    fn test_equal_scores_and_times_lower_price_wins() {
        let o = order();
        // Both at or under budget: price sub-score identical (100), but the
        // cheaper bid must still rank first on the price tie-break.
        let bids = vec![bid("BID-X", 250_000, 0), bid("BID-Y", 240_000, 0)];
        let ranked = rank_bids(&o, &bids, &ScoringConfig::default()).unwrap();
        assert_eq!(ranked[0].score.composite, ranked[1].score.composite);
        assert_eq!(ranked[0].bid.id, "BID-Y");
    }

    #[test]
    fn test_full_tie_falls_back_to_bid_id() {
        let o = order();
        let bids = vec![bid("BID-2", 250_000, 0), bid("BID-1", 250_000, 0)];
        let ranked = rank_bids(&o, &bids, &ScoringConfig::default()).unwrap();
        assert_eq!(ranked[0].bid.id, "BID-1");
    }

    #[test]
    fn test_one_invalid_bid_fails_the_call() {
        let o = order();
        let bids = vec![bid("BID-OK", 250_000, 0), bid("BID-BAD", 0, 0)];
        assert!(rank_bids(&o, &bids, &ScoringConfig::default()).is_err());
    }

    #[test]
    fn test_recomputed_on_each_call() {
        let mut o = order();
        let bids = vec![bid("BID-A", 250_000, 0)];
        let cfg = ScoringConfig::default();
        let before = rank_bids(&o, &bids, &cfg).unwrap();

        // Requirements change: the budget is halved.
        o.budget_ceiling_cents = 125_000;
        let after = rank_bids(&o, &bids, &cfg).unwrap();
        assert!(after[0].score.price < before[0].score.price);
    }
}

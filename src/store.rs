//! Read-only collaborator contracts for externally-owned records.
//!
//! The order/vendor/user store lives outside this core. Scoring and ranking
//! only need lookups by identifier, so the seam is two small traits; the
//! in-memory implementation backs tests and local tooling the same way the
//! external store backs production.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{Bid, Order};

/// Lookup of order records by identifier.
pub trait OrderStore: Send + Sync {
    fn order(&self, order_id: &str) -> Option<Order>;
}

/// Lookup of the bids submitted against one order.
pub trait BidStore: Send + Sync {
    fn bids_for_order(&self, order_id: &str) -> Vec<Bid>;
}

/// In-memory order/bid store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: Mutex<HashMap<String, Order>>,
    bids: Mutex<Vec<Bid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_order(&self, order: Order) {
        if let Ok(mut orders) = self.orders.lock() {
            orders.insert(order.id.clone(), order);
        }
    }

    pub fn insert_bid(&self, bid: Bid) {
        if let Ok(mut bids) = self.bids.lock() {
            bids.push(bid);
        }
    }
}

impl OrderStore for MemoryStore {
    fn order(&self, order_id: &str) -> Option<Order> {
        self.orders
            .lock()
            .ok()
            .and_then(|orders| orders.get(order_id).cloned())
    }
}

impl BidStore for MemoryStore {
    fn bids_for_order(&self, order_id: &str) -> Vec<Bid> {
        self.bids
            .lock()
            .map(|bids| {
                bids.iter()
                    .filter(|b| b.order_id == order_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

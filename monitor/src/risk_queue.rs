//! Priority queue for tracking account risk (min-heap by margin ratio)

use percolator_client::health::{AccountHealth, RiskLevel};
use priority_queue::PriorityQueue;
use solana_sdk::pubkey::Pubkey;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Risk snapshot for one slab account index
#[derive(Debug, Clone)]
pub struct AccountRisk {
    /// Slot index in the slab's account table
    pub idx: u16,
    /// Owner pubkey
    pub owner: Pubkey,
    /// Margin ratio, risk level, liquidatable flag
    pub health: AccountHealth,
    /// Signed position size in native units
    pub position_size: i128,
    /// Capital in native units
    pub capital: u128,
}

impl AccountRisk {
    pub fn liquidatable(&self) -> bool {
        self.health.liquidatable
    }

    pub fn at_risk(&self) -> bool {
        self.health.risk_level >= RiskLevel::Warning
    }
}

/// Margin-ratio priority queue (min-heap: thinnest margin first)
pub struct RiskQueue {
    /// Priority queue (using Reverse for min-heap)
    queue: PriorityQueue<u16, Reverse<u64>>,
    /// Map for O(1) lookups
    map: HashMap<u16, AccountRisk>,
}

impl RiskQueue {
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            map: HashMap::new(),
        }
    }

    /// Push or update an account's risk snapshot
    pub fn push(&mut self, risk: AccountRisk) {
        let idx = risk.idx;
        let ratio = risk.health.margin_ratio_bps;
        self.map.insert(idx, risk);
        self.queue.push(idx, Reverse(ratio));
    }

    /// Pop the account with the thinnest margin
    pub fn pop(&mut self) -> Option<AccountRisk> {
        let (idx, _priority) = self.queue.pop()?;
        self.map.remove(&idx)
    }

    /// Peek at the thinnest margin without removing
    pub fn peek(&self) -> Option<&AccountRisk> {
        let (idx, _priority) = self.queue.peek()?;
        self.map.get(idx)
    }

    /// Remove an account from the queue
    pub fn remove(&mut self, idx: u16) -> Option<AccountRisk> {
        self.queue.remove(&idx);
        self.map.remove(&idx)
    }

    pub fn get(&self, idx: u16) -> Option<&AccountRisk> {
        self.map.get(&idx)
    }

    pub fn contains(&self, idx: u16) -> bool {
        self.map.contains_key(&idx)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All accounts currently flagged liquidatable, thinnest margin first
    pub fn liquidatable(&self) -> Vec<AccountRisk> {
        let mut out: Vec<AccountRisk> = self
            .map
            .values()
            .filter(|r| r.liquidatable())
            .cloned()
            .collect();
        out.sort_by_key(|r| r.health.margin_ratio_bps);
        out
    }

    /// Accounts in warning or worse, thinnest margin first
    pub fn at_risk(&self) -> Vec<AccountRisk> {
        let mut out: Vec<AccountRisk> =
            self.map.values().filter(|r| r.at_risk()).cloned().collect();
        out.sort_by_key(|r| r.health.margin_ratio_bps);
        out
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.queue.clear();
        self.map.clear();
    }
}

impl Default for RiskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use percolator_client::health::RiskLevel;

    fn make_risk(idx: u16, margin_ratio_bps: u64, maint_bps: u64) -> AccountRisk {
        let liquidatable = margin_ratio_bps < maint_bps;
        let risk_level = if liquidatable {
            RiskLevel::Liquidatable
        } else if margin_ratio_bps < 1_000 {
            RiskLevel::Danger
        } else if margin_ratio_bps < 2_000 {
            RiskLevel::Warning
        } else {
            RiskLevel::Healthy
        };
        AccountRisk {
            idx,
            owner: Pubkey::new_unique(),
            health: AccountHealth {
                margin_ratio_bps,
                risk_level,
                liquidatable,
            },
            position_size: 1_000_000,
            capital: 1_000_000,
        }
    }

    #[test]
    fn test_queue_push_pop() {
        let mut queue = RiskQueue::new();

        queue.push(make_risk(1, 450, 500));
        queue.push(make_risk(2, 5_000, 500));
        queue.push(make_risk(3, 120, 500));

        assert_eq!(queue.len(), 3);

        // Thinnest margin first
        let popped = queue.pop().unwrap();
        assert_eq!(popped.idx, 3);

        let popped = queue.pop().unwrap();
        assert_eq!(popped.idx, 1);
    }

    #[test]
    fn test_queue_peek() {
        let mut queue = RiskQueue::new();

        queue.push(make_risk(1, 3_000, 500));
        queue.push(make_risk(2, 800, 500));

        let peeked = queue.peek().unwrap();
        assert_eq!(peeked.idx, 2);

        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_liquidatable_sorted_by_ratio() {
        let mut queue = RiskQueue::new();

        queue.push(make_risk(1, 450, 500));
        queue.push(make_risk(2, 5_000, 500));
        queue.push(make_risk(3, 120, 500));

        let liq = queue.liquidatable();
        assert_eq!(liq.len(), 2);
        assert_eq!(liq[0].idx, 3);
        assert_eq!(liq[1].idx, 1);
    }

    #[test]
    fn test_at_risk_excludes_healthy() {
        let mut queue = RiskQueue::new();

        queue.push(make_risk(1, 1_500, 500)); // warning
        queue.push(make_risk(2, 5_000, 500)); // healthy
        queue.push(make_risk(3, 700, 500)); // danger

        let at_risk = queue.at_risk();
        assert_eq!(at_risk.len(), 2);
        assert_eq!(at_risk[0].idx, 3);
    }

    #[test]
    fn test_queue_update_replaces_priority() {
        let mut queue = RiskQueue::new();

        queue.push(make_risk(1, 5_000, 500));
        queue.push(make_risk(2, 3_000, 500));
        assert_eq!(queue.peek().unwrap().idx, 2);

        // Account 1 deteriorates below account 2
        queue.push(make_risk(1, 100, 500));
        assert_eq!(queue.peek().unwrap().idx, 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut queue = RiskQueue::new();

        queue.push(make_risk(1, 100, 500));
        queue.push(make_risk(2, 200, 500));

        assert!(queue.remove(1).is_some());
        assert!(!queue.contains(1));
        assert_eq!(queue.peek().unwrap().idx, 2);
    }
}

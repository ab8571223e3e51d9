//! Bounded in-memory dedup ledger.
//!
//! Entries are kept in insertion order together with the time the event
//! *occurred* on the terminal. Two limits keep memory flat on a
//! long-running process:
//!
//! | Limit | Default | Effect |
//! |-------|---------|--------|
//! | `capacity` | 10 000 | Oldest entry is evicted when a new one would exceed it |
//! | `retention` | 24 h | Events that occurred before `now - retention` are settled and pruned |
//!
//! Terminals redeliver their log on every pull, so forgetting a key must
//! never make its event look fresh again. Pruning therefore uses the
//! event's own time, and the loop skips any event older than the same
//! cutoff. Capacity eviction raises a watermark: unseen events that
//! occurred at or before the newest evicted event are settled as well.
//!
//! A retention of zero disables time-based pruning.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use crate::domain::attendance::EventKey;
use crate::domain::foundation::Timestamp;
use crate::ports::DedupLedger;

/// Size and age limits for [`BoundedDedupLedger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerLimits {
    pub capacity: usize,
    pub retention: Duration,
}

impl Default for LedgerLimits {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl LedgerLimits {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}

/// In-memory ledger with FIFO eviction.
#[derive(Debug)]
pub struct BoundedDedupLedger {
    limits: LedgerLimits,
    order: VecDeque<(EventKey, Timestamp)>,
    keys: HashSet<EventKey>,
    evicted_through: Option<Timestamp>,
}

impl BoundedDedupLedger {
    pub fn new(limits: LedgerLimits) -> Self {
        Self {
            limits,
            order: VecDeque::new(),
            keys: HashSet::new(),
            evicted_through: None,
        }
    }

    pub fn limits(&self) -> LedgerLimits {
        self.limits
    }

    /// Newest event time dropped by capacity eviction, if any.
    pub fn evicted_through(&self) -> Option<Timestamp> {
        self.evicted_through
    }

    fn evict_oldest(&mut self) {
        let Some((evicted, occurred_at)) = self.order.pop_front() else {
            return;
        };
        self.keys.remove(&evicted);
        if self
            .evicted_through
            .map_or(true, |mark| mark.is_before(&occurred_at))
        {
            self.evicted_through = Some(occurred_at);
        }
        tracing::warn!(
            evicted_key = %evicted,
            occurred_at = %occurred_at,
            capacity = self.limits.capacity,
            "Dedup ledger full, evicted oldest key"
        );
    }
}

impl Default for BoundedDedupLedger {
    fn default() -> Self {
        Self::new(LedgerLimits::default())
    }
}

impl DedupLedger for BoundedDedupLedger {
    fn contains(&self, key: &EventKey) -> bool {
        self.keys.contains(key)
    }

    fn is_settled(&self, occurred_at: &Timestamp, now: Timestamp) -> bool {
        let expired = !self.limits.retention.is_zero()
            && occurred_at.is_before(&now.minus(self.limits.retention));
        expired
            || self
                .evicted_through
                .is_some_and(|mark| !mark.is_before(occurred_at))
    }

    fn record(&mut self, key: EventKey, occurred_at: Timestamp) {
        if self.keys.contains(&key) {
            return;
        }
        while self.order.len() >= self.limits.capacity {
            self.evict_oldest();
        }
        self.keys.insert(key.clone());
        self.order.push_back((key, occurred_at));
    }

    fn prune_expired(&mut self, now: Timestamp) -> usize {
        if self.limits.retention.is_zero() {
            return 0;
        }
        let cutoff = now.minus(self.limits.retention);
        let before = self.order.len();
        let keys = &mut self.keys;
        self.order.retain(|(key, occurred_at)| {
            let keep = !occurred_at.is_before(&cutoff);
            if !keep {
                keys.remove(key);
            }
            keep
        });
        before - self.order.len()
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(s: &str) -> EventKey {
        EventKey::from(s)
    }

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    #[test]
    fn records_and_reports_keys() {
        let mut ledger = BoundedDedupLedger::default();
        ledger.record(key("1001-2025-10-20T07:30:00Z"), at(1_000));

        assert!(ledger.contains(&key("1001-2025-10-20T07:30:00Z")));
        assert!(!ledger.contains(&key("1002-2025-10-20T07:30:00Z")));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn recording_twice_keeps_one_entry() {
        let mut ledger = BoundedDedupLedger::default();
        ledger.record(key("evt"), at(1));
        ledger.record(key("evt"), at(1));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut ledger = BoundedDedupLedger::new(LedgerLimits::default().with_capacity(2));
        ledger.record(key("a"), at(1));
        ledger.record(key("b"), at(2));
        ledger.record(key("c"), at(3));

        assert!(!ledger.contains(&key("a")));
        assert!(ledger.contains(&key("b")));
        assert!(ledger.contains(&key("c")));
    }

    #[test]
    fn capacity_eviction_settles_events_up_to_the_evicted_one() {
        let limits = LedgerLimits::default()
            .with_capacity(1)
            .with_retention(Duration::ZERO);
        let mut ledger = BoundedDedupLedger::new(limits);
        ledger.record(key("a"), at(100));
        ledger.record(key("b"), at(200));

        let now = at(10_000);
        assert_eq!(ledger.evicted_through(), Some(at(100)));
        assert!(ledger.is_settled(&at(100), now));
        assert!(ledger.is_settled(&at(50), now));
        assert!(!ledger.is_settled(&at(150), now));
    }

    #[test]
    fn eviction_watermark_never_moves_backwards() {
        let mut ledger = BoundedDedupLedger::new(LedgerLimits::default().with_capacity(1));
        ledger.record(key("late"), at(500));
        ledger.record(key("early"), at(100));
        ledger.record(key("next"), at(600));

        assert_eq!(ledger.evicted_through(), Some(at(500)));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let limits = LedgerLimits::default().with_capacity(0);
        assert_eq!(limits.capacity, 1);
    }

    #[test]
    fn prune_evicts_by_event_time_not_insertion_order() {
        let limits = LedgerLimits::default().with_retention(Duration::from_secs(60));
        let mut ledger = BoundedDedupLedger::new(limits);
        ledger.record(key("fresh"), at(1_050));
        ledger.record(key("old"), at(1_000));

        let evicted = ledger.prune_expired(at(1_070));

        assert_eq!(evicted, 1);
        assert!(!ledger.contains(&key("old")));
        assert!(ledger.contains(&key("fresh")));
    }

    #[test]
    fn pruned_events_are_settled() {
        let limits = LedgerLimits::default().with_retention(Duration::from_secs(60));
        let mut ledger = BoundedDedupLedger::new(limits);
        ledger.record(key("old"), at(1_000));

        let now = at(1_070);
        ledger.prune_expired(now);

        assert!(!ledger.contains(&key("old")));
        assert!(ledger.is_settled(&at(1_000), now));
        assert!(!ledger.is_settled(&at(1_010), now));
    }

    #[test]
    fn zero_retention_never_prunes() {
        let limits = LedgerLimits::default().with_retention(Duration::ZERO);
        let mut ledger = BoundedDedupLedger::new(limits);
        ledger.record(key("a"), at(0));

        assert_eq!(ledger.prune_expired(Timestamp::now()), 0);
        assert!(ledger.contains(&key("a")));
        assert!(!ledger.is_settled(&at(0), Timestamp::now()));
    }

    proptest! {
        /// The ledger never exceeds capacity and always holds the newest keys.
        #[test]
        fn size_stays_within_capacity(
            capacity in 1usize..16,
            ids in prop::collection::vec(0u32..64, 0..200),
        ) {
            let mut ledger = BoundedDedupLedger::new(LedgerLimits::default().with_capacity(capacity));
            for (n, id) in ids.iter().enumerate() {
                ledger.record(key(&id.to_string()), at(n as i64));
                prop_assert!(ledger.len() <= capacity);
            }
            if let Some(last) = ids.last() {
                prop_assert!(ledger.contains(&key(&last.to_string())));
            }
        }

        /// Once recorded, an event is either still held or settled; it never reads as fresh.
        #[test]
        fn recorded_event_never_becomes_fresh(
            capacity in 1usize..8,
            times in prop::collection::vec(0i64..10_000, 1..60),
            later in 0i64..20_000,
        ) {
            let limits = LedgerLimits::default()
                .with_capacity(capacity)
                .with_retention(Duration::from_secs(3_600));
            let mut ledger = BoundedDedupLedger::new(limits);
            for (n, secs) in times.iter().enumerate() {
                ledger.record(key(&format!("evt-{n}")), at(*secs));
            }
            let now = at(10_000 + later);
            ledger.prune_expired(now);
            for (n, secs) in times.iter().enumerate() {
                let held = ledger.contains(&key(&format!("evt-{n}")));
                prop_assert!(held || ledger.is_settled(&at(*secs), now));
            }
        }
    }
}

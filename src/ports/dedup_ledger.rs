//! DedupLedger port - Tracking which attendance events were processed.
//!
//! Terminals redeliver their whole attendance log on every pull, so the
//! same physical event is observed many times. The ledger turns that
//! at-least-once delivery into at-most-once processing.
//!
//! The reconciliation loop owns its ledger exclusively and is its only
//! reader and writer, so the interface is synchronous and takes `&mut self`
//! for writes. Keys are recorded *before* any side effect of the event
//! starts; an event that fails mid-dispatch is not retried.
//!
//! A ledger may forget keys to stay bounded. Whatever it forgets must be
//! reported through [`DedupLedger::is_settled`], so a redelivered event
//! whose key was dropped is still never processed twice.

use crate::domain::attendance::EventKey;
use crate::domain::foundation::Timestamp;

/// Port for the processed-event ledger.
///
/// # Example
///
/// ```ignore
/// if ledger.is_settled(&event.occurred_at, now) || ledger.contains(&key) {
///     return; // replay
/// }
/// ledger.record(key.clone(), event.occurred_at);
/// // resolve fee status, print, notify...
/// ```
pub trait DedupLedger: Send {
    /// Whether `key` has already been recorded.
    fn contains(&self, key: &EventKey) -> bool;

    /// Whether an event that occurred at `occurred_at` lies outside what the
    /// ledger still remembers as of `now`. Such events count as processed.
    fn is_settled(&self, occurred_at: &Timestamp, now: Timestamp) -> bool;

    /// Record `key` for an event that occurred at `occurred_at`.
    /// Recording a present key is a no-op.
    fn record(&mut self, key: EventKey, occurred_at: Timestamp);

    /// Drop entries that are settled as of `now`.
    ///
    /// Returns the number of entries evicted.
    fn prune_expired(&mut self, now: Timestamp) -> usize;

    /// Number of keys currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Unbounded set, the simplest possible ledger.
    struct SetLedger {
        keys: HashSet<EventKey>,
    }

    impl DedupLedger for SetLedger {
        fn contains(&self, key: &EventKey) -> bool {
            self.keys.contains(key)
        }

        fn is_settled(&self, _occurred_at: &Timestamp, _now: Timestamp) -> bool {
            false
        }

        fn record(&mut self, key: EventKey, _occurred_at: Timestamp) {
            self.keys.insert(key);
        }

        fn prune_expired(&mut self, _now: Timestamp) -> usize {
            0
        }

        fn len(&self) -> usize {
            self.keys.len()
        }
    }

    #[test]
    fn dedup_ledger_is_object_safe() {
        let ledger: Box<dyn DedupLedger> = Box::new(SetLedger {
            keys: HashSet::new(),
        });
        assert!(ledger.is_empty());
    }

    #[test]
    fn contains_returns_true_after_record() {
        let mut ledger = SetLedger {
            keys: HashSet::new(),
        };
        let key = EventKey::from("1001-2025-10-20T07:30:00Z");

        assert!(!ledger.contains(&key));
        ledger.record(key.clone(), Timestamp::now());
        assert!(ledger.contains(&key));
    }

    #[test]
    fn record_is_idempotent() {
        let mut ledger = SetLedger {
            keys: HashSet::new(),
        };
        let at = Timestamp::now();
        ledger.record(EventKey::from("evt-1"), at);
        ledger.record(EventKey::from("evt-1"), at);
        assert_eq!(ledger.len(), 1);
    }
}

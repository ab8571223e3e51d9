//! ReconciliationLoop - Background service that turns device records into receipts.
//!
//! One iteration:
//! 1. **Poll** the device. On failure the connection is torn down, the loop
//!    waits out the reconnect backoff and tries to connect once; the batch
//!    is abandoned.
//! 2. **Normalize** each record. A malformed record is logged and skipped;
//!    the rest of the batch carries on.
//! 3. **Dedup** by event key. Events older than the ledger's window are
//!    skipped as settled. Keys are recorded before any side effect, so a
//!    redelivered record never prints twice, even if dispatch fails.
//! 4. **Dispatch** through the [`Dispatcher`] (fee lookup, then one print).
//! 5. **Notify** the terminal, best-effort. Approvals notify only when the
//!    receipt printed; denials always notify.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 3s | Time between iterations |
//! | `reconnect_backoff` | 5s | Pause between a failed poll and the reconnect |
//! | `device_timeout` | 10s | Bound on every device call |
//!
//! ## Ownership
//!
//! The loop is the only user of its dedup ledger and the only caller of
//! `connect`/`disconnect` on the gateway. It runs on a single task; no two
//! iterations overlap.
//!
//! ## Graceful Shutdown
//!
//! The loop listens for a shutdown signal, lets the in-flight iteration
//! finish, then disconnects from the device. A pending reconnect backoff is
//! cut short by the signal and the reconnect is skipped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

use crate::application::handlers::attendance::Dispatcher;
use crate::domain::attendance::{DeviceRecord, ProcessingOutcome, RawEvent};
use crate::domain::foundation::Timestamp;
use crate::ports::{DedupLedger, DeviceGateway, GatewayError};

use super::loop_status::{BatchSummary, LoopSnapshot};

/// Configuration for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// How often to poll the device.
    pub poll_interval: Duration,

    /// Wait between a failed poll and the reconnect attempt.
    pub reconnect_backoff: Duration,

    /// Upper bound for each device call.
    pub device_timeout: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            reconnect_backoff: Duration::from_secs(5),
            device_timeout: Duration::from_secs(10),
        }
    }
}

impl ReconcileConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }
}

/// Polls the device and dispatches each new event exactly once.
pub struct ReconciliationLoop {
    gateway: Arc<dyn DeviceGateway>,
    dispatcher: Arc<Dispatcher>,
    ledger: Box<dyn DedupLedger>,
    config: ReconcileConfig,
    snapshot: LoopSnapshot,
    status: watch::Sender<LoopSnapshot>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl ReconciliationLoop {
    /// Create a loop with default configuration.
    pub fn new(
        gateway: Arc<dyn DeviceGateway>,
        dispatcher: Arc<Dispatcher>,
        ledger: Box<dyn DedupLedger>,
    ) -> Self {
        Self::with_config(gateway, dispatcher, ledger, ReconcileConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn DeviceGateway>,
        dispatcher: Arc<Dispatcher>,
        ledger: Box<dyn DedupLedger>,
        config: ReconcileConfig,
    ) -> Self {
        let (status, _) = watch::channel(LoopSnapshot::default());
        Self {
            gateway,
            dispatcher,
            ledger,
            config,
            snapshot: LoopSnapshot::default(),
            status,
            shutdown: None,
        }
    }

    /// Receiver for the snapshot published after every iteration.
    pub fn subscribe(&self) -> watch::Receiver<LoopSnapshot> {
        self.status.subscribe()
    }

    pub fn snapshot(&self) -> &LoopSnapshot {
        &self.snapshot
    }

    /// Run until the shutdown flag is set or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.shutdown = Some(shutdown.clone());

        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Reconciliation loop started"
        );

        if !*shutdown.borrow() {
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }

                    _ = interval.tick() => {
                        self.poll_once().await;
                    }
                }
            }
        }

        self.gateway.disconnect().await;
        self.publish();
        tracing::info!(
            processed = self.snapshot.processed,
            "Reconciliation loop stopped"
        );
    }

    /// Run exactly one iteration.
    pub async fn poll_once(&mut self) -> BatchSummary {
        let mut batch = BatchSummary::default();

        if !self.gateway.is_connected() && !self.connect().await {
            batch.poll_failed = true;
            self.finish(&batch);
            return batch;
        }

        let records = match self.pull().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    backoff_ms = self.config.reconnect_backoff.as_millis() as u64,
                    "Device poll failed, reconnecting"
                );
                self.gateway.disconnect().await;
                if self.back_off().await {
                    self.snapshot.reconnects += 1;
                    self.connect().await;
                } else {
                    tracing::info!("Shutdown requested during reconnect backoff");
                }
                batch.poll_failed = true;
                self.finish(&batch);
                return batch;
            }
        };

        batch.pulled = records.len();

        let now = Timestamp::now();
        let expired = self.ledger.prune_expired(now);
        if expired > 0 {
            tracing::debug!(expired, "Pruned expired event keys");
        }

        for record in records {
            self.handle_record(record, now, &mut batch).await;
        }

        self.finish(&batch);
        batch
    }

    async fn handle_record(
        &mut self,
        record: DeviceRecord,
        now: Timestamp,
        batch: &mut BatchSummary,
    ) {
        let event = match RawEvent::try_from(record) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed device record");
                batch.malformed += 1;
                return;
            }
        };

        let key = event.key();
        if self.ledger.is_settled(&event.occurred_at, now) {
            tracing::trace!(
                event_key = %key,
                occurred_at = %event.occurred_at,
                "Skipping event outside the dedup window"
            );
            batch.stale += 1;
            return;
        }
        if self.ledger.contains(&key) {
            tracing::trace!(event_key = %key, "Skipping already processed event");
            batch.duplicates += 1;
            return;
        }
        self.ledger.record(key.clone(), event.occurred_at);
        batch.dispatched += 1;

        let span = tracing::info_span!(
            "dispatch",
            dispatch_id = %Uuid::new_v4(),
            event_key = %key,
            subject_id = %event.subject_id,
        );
        self.dispatch(&event).instrument(span).await;
    }

    async fn dispatch(&mut self, event: &RawEvent) {
        let report = self.dispatcher.dispatch(event).await;

        if report.outcome.is_approved() {
            self.snapshot.approvals += 1;
        } else {
            self.snapshot.denials += 1;
        }
        if !report.printed() {
            self.snapshot.print_failures += 1;
        }

        let message = match (&report.outcome, report.printed()) {
            (ProcessingOutcome::Approved(_), false) => None,
            (outcome, _) => Some(outcome.notify_message()),
        };

        if let Some(message) = message {
            if let Err(e) = self.notify(message).await {
                tracing::warn!(error = %e, "Device notify failed");
                self.snapshot.notify_failures += 1;
            }
        }
    }

    /// Waits out the reconnect backoff. Returns `false` if shutdown was
    /// requested first.
    async fn back_off(&mut self) -> bool {
        let pause = time::sleep(self.config.reconnect_backoff);
        let Some(shutdown) = self.shutdown.as_mut() else {
            pause.await;
            return true;
        };
        tokio::select! {
            _ = pause => true,
            _ = shutdown_requested(shutdown) => false,
        }
    }

    async fn connect(&mut self) -> bool {
        let result = time::timeout(self.config.device_timeout, self.gateway.connect())
            .await
            .unwrap_or(Err(GatewayError::Timeout(self.config.device_timeout)));

        match result {
            Ok(()) => {
                tracing::info!("Connected to attendance device");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not connect to attendance device");
                false
            }
        }
    }

    async fn pull(&mut self) -> Result<Vec<DeviceRecord>, GatewayError> {
        time::timeout(self.config.device_timeout, self.gateway.pull_events())
            .await
            .unwrap_or(Err(GatewayError::Timeout(self.config.device_timeout)))
    }

    async fn notify(&mut self, message: &str) -> Result<(), GatewayError> {
        time::timeout(self.config.device_timeout, self.gateway.notify(message))
            .await
            .unwrap_or(Err(GatewayError::Timeout(self.config.device_timeout)))
    }

    fn finish(&mut self, batch: &BatchSummary) {
        self.snapshot.absorb(batch);
        self.snapshot.last_poll_at = Some(Timestamp::now());
        self.publish();
    }

    fn publish(&mut self) {
        self.snapshot.device_connected = self.gateway.is_connected();
        self.snapshot.ledger_size = self.ledger.len();
        self.status.send_replace(self.snapshot.clone());
    }
}

/// Resolves once the flag is set or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        let stop = *shutdown.borrow_and_update();
        if stop {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dedup::{BoundedDedupLedger, LedgerLimits};
    use crate::adapters::device::QueueDeviceGateway;
    use crate::adapters::printer::LogReceiptSink;
    use crate::adapters::school_api::MockFeeStatusClient;
    use crate::domain::attendance::{FeeStatus, NOTIFY_GRANTED, NOTIFY_UNPAID};
    use serde_json::json;

    fn fixture() -> (Arc<QueueDeviceGateway>, Arc<MockFeeStatusClient>, ReconciliationLoop) {
        let gateway = Arc::new(QueueDeviceGateway::new("device:4370"));
        let fees = Arc::new(MockFeeStatusClient::new());
        fees.set_status(FeeStatus::new("1001", true).with_name("Wangari Maathai"));
        fees.set_status(FeeStatus::new("1002", false));
        let dispatcher = Arc::new(Dispatcher::new(
            fees.clone(),
            Some(Arc::new(LogReceiptSink::new())),
        ));
        let config = ReconcileConfig::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_reconnect_backoff(Duration::ZERO);
        // Fixed dates below are long past; age-based pruning stays off here.
        let limits = LedgerLimits::default().with_retention(Duration::ZERO);
        let reconciler = ReconciliationLoop::with_config(
            gateway.clone(),
            dispatcher,
            Box::new(BoundedDedupLedger::new(limits)),
            config,
        );
        (gateway, fees, reconciler)
    }

    fn with_ledger(reconciler: ReconciliationLoop, limits: LedgerLimits) -> ReconciliationLoop {
        ReconciliationLoop {
            ledger: Box::new(BoundedDedupLedger::new(limits)),
            ..reconciler
        }
    }

    fn minutes_ago(minutes: u64) -> String {
        Timestamp::now()
            .minus(Duration::from_secs(minutes * 60))
            .to_rfc3339()
    }

    fn record(user_id: &str, at: &str) -> DeviceRecord {
        DeviceRecord::named(user_id, at)
    }

    #[tokio::test]
    async fn first_poll_connects_and_dispatches() {
        let (gateway, fees, mut reconciler) = fixture();
        gateway.push(record("1001", "2025-10-20 07:30:00"));

        let batch = reconciler.poll_once().await;

        assert!(gateway.is_connected());
        assert_eq!(batch.dispatched, 1);
        assert_eq!(fees.call_count(), 1);
        assert_eq!(gateway.messages(), vec![NOTIFY_GRANTED.to_string()]);
    }

    #[tokio::test]
    async fn duplicates_within_a_batch_dispatch_once() {
        let (gateway, fees, mut reconciler) = fixture();
        gateway.extend([
            record("1001", "2025-10-20 07:30:00"),
            record("1001", "2025-10-20 07:30:00"),
        ]);

        let batch = reconciler.poll_once().await;

        assert_eq!(batch.dispatched, 1);
        assert_eq!(batch.duplicates, 1);
        assert_eq!(fees.call_count(), 1);
    }

    #[tokio::test]
    async fn duplicates_across_polls_dispatch_once() {
        let (gateway, fees, mut reconciler) = fixture();
        gateway.push(record("1002", "2025-10-20 07:30:00"));
        reconciler.poll_once().await;
        gateway.push(record("1002", "2025-10-20 07:30:00"));

        let batch = reconciler.poll_once().await;

        assert_eq!(batch.duplicates, 1);
        assert_eq!(fees.call_count(), 1);
        assert_eq!(gateway.messages(), vec![NOTIFY_UNPAID.to_string()]);
    }

    #[tokio::test]
    async fn events_older_than_retention_are_skipped() {
        let (gateway, fees, reconciler) = fixture();
        let mut reconciler = with_ledger(reconciler, LedgerLimits::default());
        gateway.extend([
            record("1001", "2025-10-20 07:30:00"),
            record("1002", &minutes_ago(5)),
        ]);

        let batch = reconciler.poll_once().await;

        assert_eq!(batch.stale, 1);
        assert_eq!(batch.dispatched, 1);
        assert_eq!(fees.calls()[0].subject_id, "1002");
        assert_eq!(fees.call_count(), 1);
        assert_eq!(reconciler.snapshot().stale_skipped, 1);
    }

    #[tokio::test]
    async fn capacity_evicted_event_is_not_dispatched_again() {
        let (gateway, fees, reconciler) = fixture();
        let mut reconciler = with_ledger(reconciler, LedgerLimits::default().with_capacity(1));
        let log = [record("1001", &minutes_ago(10)), record("1002", &minutes_ago(5))];
        gateway.extend(log.clone());
        reconciler.poll_once().await;
        gateway.extend(log);

        let batch = reconciler.poll_once().await;

        assert_eq!(batch.dispatched, 0);
        assert_eq!(batch.stale, 1);
        assert_eq!(batch.duplicates, 1);
        assert_eq!(fees.call_count(), 2);
    }

    #[tokio::test]
    async fn malformed_record_does_not_abort_batch() {
        let (gateway, fees, mut reconciler) = fixture();
        gateway.extend([
            record("1001", "2025-10-20 07:30:00"),
            serde_json::from_value(json!({"timestamp": "2025-10-20 07:31:00"})).unwrap(),
            record("1002", "2025-10-20 07:32:00"),
        ]);

        let batch = reconciler.poll_once().await;

        assert_eq!(batch.malformed, 1);
        assert_eq!(batch.dispatched, 2);
        assert_eq!(fees.call_count(), 2);
    }

    #[tokio::test]
    async fn failed_poll_reconnects_once() {
        let (gateway, _fees, mut reconciler) = fixture();
        reconciler.poll_once().await;
        gateway.fail_next_pulls(1);

        let batch = reconciler.poll_once().await;

        assert!(batch.poll_failed);
        assert_eq!(gateway.connect_attempts(), 2);
        assert!(gateway.is_connected());
        assert_eq!(reconciler.snapshot().reconnects, 1);
    }

    #[tokio::test]
    async fn unreachable_device_is_retried_next_iteration() {
        let (gateway, _fees, mut reconciler) = fixture();
        gateway.fail_next_connects(1);

        assert!(reconciler.poll_once().await.poll_failed);
        assert!(!reconciler.poll_once().await.poll_failed);
        assert_eq!(gateway.connect_attempts(), 2);
    }

    #[tokio::test]
    async fn notify_failure_is_counted_not_raised() {
        let (gateway, _fees, mut reconciler) = fixture();
        gateway.push(record("1002", "2025-10-20 07:30:00"));
        gateway.fail_next_notifies(1);

        let batch = reconciler.poll_once().await;

        assert_eq!(batch.dispatched, 1);
        assert_eq!(reconciler.snapshot().notify_failures, 1);
        assert_eq!(reconciler.snapshot().denials, 1);
    }

    #[tokio::test]
    async fn snapshot_is_published_after_each_poll() {
        let (gateway, _fees, mut reconciler) = fixture();
        let status = reconciler.subscribe();
        gateway.push(record("1001", "2025-10-20 07:30:00"));

        reconciler.poll_once().await;

        let snapshot = status.borrow().clone();
        assert_eq!(snapshot.iterations, 1);
        assert_eq!(snapshot.approvals, 1);
        assert_eq!(snapshot.ledger_size, 1);
        assert!(snapshot.device_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_waits_for_the_backoff() {
        let (gateway, _fees, reconciler) = fixture();
        let mut reconciler = ReconciliationLoop {
            config: ReconcileConfig::default().with_reconnect_backoff(Duration::from_secs(5)),
            ..reconciler
        };
        reconciler.poll_once().await;
        gateway.fail_next_pulls(1);

        let poll = tokio::spawn(async move {
            reconciler.poll_once().await;
            reconciler
        });
        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(gateway.connect_attempts(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let reconciler = poll.await.unwrap();
        assert_eq!(gateway.connect_attempts(), 2);
        assert_eq!(reconciler.snapshot().reconnects, 1);
    }

    #[tokio::test]
    async fn shutdown_cuts_the_reconnect_backoff_short() {
        let (gateway, _fees, reconciler) = fixture();
        let reconciler = ReconciliationLoop {
            config: ReconcileConfig::default()
                .with_poll_interval(Duration::from_millis(10))
                .with_reconnect_backoff(Duration::from_secs(60)),
            ..reconciler
        };
        gateway.fail_next_pulls(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(reconciler.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop should stop without waiting out the backoff")
            .unwrap();
        assert_eq!(gateway.connect_attempts(), 1);
        assert!(!gateway.is_connected());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_and_disconnects() {
        let (gateway, _fees, reconciler) = fixture();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(reconciler.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(gateway.connect_attempts() >= 1);
        assert!(!gateway.is_connected());
    }
}

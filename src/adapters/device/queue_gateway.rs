//! In-memory buffered device gateway.
//!
//! Stands in for a terminal transport: records are pushed into a buffer
//! (by the HTTP façade or by tests) and handed to the reconciliation loop
//! on the next pull. Display messages sent with `notify` are kept, newest
//! last, so they can be inspected.
//!
//! Failure injection lets tests exercise the loop's reconnect path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::attendance::DeviceRecord;
use crate::ports::{DeviceGateway, GatewayError};

/// Number of display messages retained.
const MESSAGE_HISTORY: usize = 32;

/// Buffered gateway backed by in-process queues.
///
/// # Example
///
/// ```ignore
/// let gateway = Arc::new(QueueDeviceGateway::new("192.168.1.201:4370"));
/// gateway.push(DeviceRecord::named("1001", "2025-10-20 07:30:00"));
/// ```
#[derive(Debug)]
pub struct QueueDeviceGateway {
    address: String,
    connected: AtomicBool,
    connect_attempts: AtomicUsize,
    pending: Mutex<VecDeque<DeviceRecord>>,
    messages: Mutex<VecDeque<String>>,
    faults: Mutex<Faults>,
}

#[derive(Debug, Default)]
struct Faults {
    failing_pulls: usize,
    failing_connects: usize,
    failing_notifies: usize,
}

impl QueueDeviceGateway {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connected: AtomicBool::new(false),
            connect_attempts: AtomicUsize::new(0),
            pending: Mutex::new(VecDeque::new()),
            messages: Mutex::new(VecDeque::new()),
            faults: Mutex::new(Faults::default()),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Enqueues a record for the next pull.
    pub fn push(&self, record: DeviceRecord) {
        lock(&self.pending).push_back(record);
    }

    /// Enqueues several records, preserving order.
    pub fn extend(&self, records: impl IntoIterator<Item = DeviceRecord>) {
        lock(&self.pending).extend(records);
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Display messages received so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).iter().cloned().collect()
    }

    /// Total `connect` calls, successful or not.
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Makes the next `count` pulls fail with a transport error.
    pub fn fail_next_pulls(&self, count: usize) {
        lock(&self.faults).failing_pulls = count;
    }

    /// Makes the next `count` connects fail.
    pub fn fail_next_connects(&self, count: usize) {
        lock(&self.faults).failing_connects = count;
    }

    /// Makes the next `count` notifies fail.
    pub fn fail_next_notifies(&self, count: usize) {
        lock(&self.faults).failing_notifies = count;
    }

    fn take_fault(&self, pick: impl FnOnce(&mut Faults) -> &mut usize) -> bool {
        let mut faults = lock(&self.faults);
        let remaining = pick(&mut *faults);
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl DeviceGateway for QueueDeviceGateway {
    async fn connect(&self) -> Result<(), GatewayError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        if self.take_fault(|f| &mut f.failing_connects) {
            self.connected.store(false, Ordering::SeqCst);
            return Err(GatewayError::transport(format!(
                "connection to {} refused",
                self.address
            )));
        }
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!(address = %self.address, "Device gateway connected");
        Ok(())
    }

    async fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            tracing::debug!(address = %self.address, "Device gateway disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn pull_events(&self) -> Result<Vec<DeviceRecord>, GatewayError> {
        if !self.is_connected() {
            return Err(GatewayError::NotConnected);
        }
        if self.take_fault(|f| &mut f.failing_pulls) {
            return Err(GatewayError::transport("attendance read interrupted"));
        }
        Ok(lock(&self.pending).drain(..).collect())
    }

    async fn notify(&self, message: &str) -> Result<(), GatewayError> {
        if !self.is_connected() {
            return Err(GatewayError::NotConnected);
        }
        if self.take_fault(|f| &mut f.failing_notifies) {
            return Err(GatewayError::transport("display write failed"));
        }
        let mut messages = lock(&self.messages);
        if messages.len() == MESSAGE_HISTORY {
            messages.pop_front();
        }
        messages.push_back(message.to_string());
        Ok(())
    }
}

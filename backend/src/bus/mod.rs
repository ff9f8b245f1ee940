//! C8 — Subscription Bus.
//!
//! Each subscriber holds a bounded mailbox. Publishers enqueue
//! non-blockingly: a full mailbox drops its oldest entry and advances a
//! per-subscriber drop counter (P8) rather than ever blocking the
//! publisher (§4.8).
//!
//! `tokio::sync::broadcast` was considered and rejected: an overflowing
//! broadcast channel reports `RecvError::Lagged(n)` to the lagging
//! *reader*, discarding messages it hasn't read yet, which is not the
//! same as "drop the single oldest entry, keep a running counter" this
//! spec asks for. Instead every subscriber gets its own bounded queue
//! behind a `Mutex`, with `push` popping the oldest entry itself when
//! full — grounded in `brbtavares-tucano`'s per-connection mailbox and
//! `cooprefr-bettersys`'s per-client channel registry, both of which give
//! every subscriber an independent bounded queue rather than a single
//! shared broadcast.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Default per-subscriber mailbox capacity, matching the teacher's
/// general preference for small fixed-size buffers over unbounded queues.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// A single message carried on the bus: `{event_name, payload, timestamp}`
/// (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    pub event_name: String,
    pub payload: serde_json::Value,
    pub timestamp_ms: u64,
}

impl BusEvent {
    pub fn new(event_name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_name: event_name.into(),
            payload,
            timestamp_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

struct Mailbox {
    queue: Mutex<VecDeque<BusEvent>>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl Mailbox {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Non-blocking push. Drops the oldest entry and advances the drop
    /// counter when the mailbox is already full (P8).
    fn push(&self, event: BusEvent) {
        let mut queue = self.queue.lock().unwrap_or_else(|p| p.into_inner());
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(event);
        drop(queue);
        self.notify.notify_one();
    }

    async fn recv(&self) -> BusEvent {
        loop {
            {
                let mut queue = self.queue.lock().unwrap_or_else(|p| p.into_inner());
                if let Some(event) = queue.pop_front() {
                    return event;
                }
            }
            self.notify.notified().await;
        }
    }

    fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// A single subscriber's handle onto the bus. Dropping it does not
/// automatically unregister — call `SubscriptionBus::unsubscribe` on
/// disconnect so the bus never retains dangling references (§4.8).
pub struct Subscription {
    id: u64,
    mailbox: Arc<Mailbox>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn recv(&self) -> BusEvent {
        self.mailbox.recv().await
    }

    pub fn dropped_count(&self) -> u64 {
        self.mailbox.dropped_count()
    }
}

pub struct SubscriptionBus {
    next_id: AtomicU64,
    subscribers: Mutex<BTreeMap<u64, Arc<Mailbox>>>,
    mailbox_capacity: usize,
}

impl Default for SubscriptionBus {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_CAPACITY)
    }
}

impl SubscriptionBus {
    pub fn new(mailbox_capacity: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(BTreeMap::new()),
            mailbox_capacity,
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mailbox = Arc::new(Mailbox::new(self.mailbox_capacity));
        self.subscribers.lock().unwrap_or_else(|p| p.into_inner()).insert(id, mailbox.clone());
        Subscription { id, mailbox }
    }

    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().unwrap_or_else(|p| p.into_inner()).remove(&id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Publish to every registered mailbox. Synchronous and non-blocking
    /// by construction (every `Mailbox::push` call is a plain mutex
    /// section, never an `.await`) so this can be called directly from
    /// inside the tick loop's async task without spawning (Open Question
    /// (a), §9).
    pub fn publish(&self, event_name: &str, payload: serde_json::Value) {
        let event = BusEvent::new(event_name, payload);
        let subscribers = self.subscribers.lock().unwrap_or_else(|p| p.into_inner());
        for mailbox in subscribers.values() {
            mailbox.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_mailbox_drops_oldest_and_counts() {
        let bus = SubscriptionBus::new(2);
        let sub = bus.subscribe();
        bus.publish("a", serde_json::json!(1));
        bus.publish("b", serde_json::json!(2));
        bus.publish("c", serde_json::json!(3));

        let first = sub.recv().await;
        assert_eq!(first.event_name, "b");
        let second = sub.recv().await;
        assert_eq!(second.event_name, "c");
        assert_eq!(sub.dropped_count(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_stops_future_delivery() {
        let bus = SubscriptionBus::new(4);
        let sub = bus.subscribe();
        bus.unsubscribe(sub.id());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn one_slow_subscriber_does_not_affect_others() {
        let bus = SubscriptionBus::new(1);
        let slow = bus.subscribe();
        let fast = bus.subscribe();
        bus.publish("x", serde_json::json!(1));
        bus.publish("y", serde_json::json!(2));

        // `slow` never calls recv; `fast` still gets delivery and no drops.
        let event = fast.recv().await;
        assert_eq!(event.event_name, "x");
        assert_eq!(slow.dropped_count(), 1);
    }
}

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::models::RealtimeEvent;

type Predicate = Box<dyn Fn(&RealtimeEvent) -> bool + Send + Sync>;
type Callback = Box<dyn Fn(&RealtimeEvent) + Send + Sync>;

struct Listener {
    id: u64,
    active: AtomicBool,
    predicate: Predicate,
    callback: Callback,
}

#[derive(Default)]
struct BusInner {
    listeners: Mutex<Vec<Arc<Listener>>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn listeners(&self) -> MutexGuard<'_, Vec<Arc<Listener>>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("event bus listener registry poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn remove(&self, id: u64) {
        self.listeners().retain(|listener| listener.id != id);
    }
}

/// Page-local broadcast of realtime events.
///
/// Handles are cheap to clone and are passed explicitly to every hook that
/// needs them. Delivery is synchronous and in publish order; there is no
/// buffering and no deduplication.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for every published event accepted by `predicate`.
    /// The listener lives until the returned [`Subscription`] is disposed or
    /// dropped.
    pub fn subscribe<P, C>(&self, predicate: P, callback: C) -> Subscription
    where
        P: Fn(&RealtimeEvent) -> bool + Send + Sync + 'static,
        C: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let listener = Arc::new(Listener {
            id,
            active: AtomicBool::new(true),
            predicate: Box::new(predicate),
            callback: Box::new(callback),
        });
        self.inner.listeners().push(listener.clone());
        tracing::debug!(subscription_id = id, "subscribed");

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
            listener,
        }
    }

    /// Deliver `event` to all live matching listeners. Returns how many
    /// callbacks ran.
    pub fn publish(&self, event: &RealtimeEvent) -> usize {
        // Snapshot so callbacks may subscribe or dispose without deadlocking.
        let snapshot: Vec<Arc<Listener>> = self.inner.listeners().clone();

        let mut delivered = 0;
        for listener in snapshot {
            if !listener.active.load(Ordering::Acquire) {
                continue;
            }
            if (listener.predicate)(event) {
                (listener.callback)(event);
                delivered += 1;
            }
        }
        tracing::trace!(event = %event.event, channel = %event.channel, delivered, "published");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners().len()
    }
}

/// Scoped ownership of one bus listener. Disposing is idempotent and also
/// happens on drop.
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
    listener: Arc<Listener>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.listener.active.load(Ordering::Acquire)
    }

    pub fn dispose(&mut self) {
        if !self.listener.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
        tracing::debug!(subscription_id = self.id, "disposed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn event(kind: &str, channel: &str) -> RealtimeEvent {
        RealtimeEvent::new(EventKind::from_name(kind), channel, json!({}))
    }

    #[test]
    fn publish_reaches_matching_listeners_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = bus.subscribe(|_| true, move |e| first.lock().unwrap().push(format!("a:{}", e.event)));
        let second = seen.clone();
        let _b = bus.subscribe(
            |e| e.channel == "company:1",
            move |e| second.lock().unwrap().push(format!("b:{}", e.event)),
        );

        assert_eq!(bus.publish(&event("invoice_ingested", "company:1")), 2);
        assert_eq!(bus.publish(&event("summary_updated", "company:2")), 1);

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["a:invoice_ingested", "b:invoice_ingested", "a:summary_updated"]
        );
    }

    #[test]
    fn disposed_subscription_never_fires_again() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut sub = bus.subscribe(|_| true, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&event("summary_updated", "company:1"));
        sub.dispose();
        sub.dispose();
        bus.publish(&event("summary_updated", "company:1"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!sub.is_active());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn dropping_the_guard_detaches_the_listener() {
        let bus = EventBus::new();
        {
            let _sub = bus.subscribe(|_| true, |_| {});
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(&event("summary_updated", "company:1")), 0);
    }

    #[test]
    fn duplicate_events_are_delivered_twice() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _sub = bus.subscribe(|_| true, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let duplicate = event("invoice_analyzed", "company:1");
        bus.publish(&duplicate);
        bus.publish(&duplicate);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_disposed_mid_publish_is_skipped() {
        let bus = EventBus::new();
        let later: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = later.clone();
        let _first = bus.subscribe(|_| true, move |_| {
            if let Some(mut sub) = slot.lock().unwrap().take() {
                sub.dispose();
            }
        });

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let second = bus.subscribe(|_| true, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        *later.lock().unwrap() = Some(second);

        assert_eq!(bus.publish(&event("summary_updated", "company:1")), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn subscribing_mid_publish_waits_for_the_next_event() {
        let bus = EventBus::new();
        let added: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let hits = Arc::new(AtomicUsize::new(0));

        let handle = bus.clone();
        let store = added.clone();
        let counter = hits.clone();
        let mut first = bus.subscribe(|_| true, move |_| {
            let mut store = store.lock().unwrap();
            if store.is_empty() {
                let counter = counter.clone();
                store.push(handle.subscribe(|_| true, move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        });

        assert_eq!(bus.publish(&event("invoice_ingested", "company:1")), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.publish(&event("invoice_ingested", "company:1")), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        first.dispose();
        added.lock().unwrap().clear();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outliving_the_bus_disposes_cleanly() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(|_| true, |_| {});
        drop(bus);
        sub.dispose();
        assert!(!sub.is_active());
    }
}

//! Event broker: synchronous, typed, in-process fan-out
//!
//! `publish` snapshots the listeners registered for the payload's kind and
//! invokes them one by one on the caller's thread, in registration order.
//! Each invocation runs behind its own error boundary: a listener that
//! returns `Err` or panics is reported and skipped, and dispatch continues.
//!
//! The registry lock is released before the first listener runs, so
//! listeners may subscribe or unsubscribe while being dispatched; such
//! changes only affect later publishes.
//!
//! Panic containment relies on unwinding; builds with `panic = "abort"`
//! lose it.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::FutureExt;
use tracing::debug;

use super::listener::{Entry, Listener, ListenerOutcome, Subscription};
use super::observer::{MetricsObserver, PublishObserver, TracingObserver};
use super::report::{DeliveryReport, FailureCause, ListenerFailure};
use crate::config::BrokerConfig;
use crate::domain::events::{DomainEvent, Event, EventKind, EventRecord};

/// Default soft cap on listeners per kind.
pub const DEFAULT_MAX_LISTENERS: usize = 20;

type Observers = Arc<Vec<Arc<dyn PublishObserver>>>;

pub struct EventBroker {
    registry: DashMap<EventKind, Vec<Arc<Entry>>>,
    observers: Observers,
    max_listeners: AtomicUsize,
    /// Kinds already warned about; cleared when the count drops back.
    overflowed: DashMap<EventKind, ()>,
    next_id: AtomicU64,
}

/// Shared broker type, owned by the composition root
pub type SharedEventBroker = Arc<EventBroker>;

/// Create a shared broker from config
pub fn create_event_broker(config: &BrokerConfig) -> SharedEventBroker {
    Arc::new(EventBroker::from_config(config))
}

impl EventBroker {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EventBrokerBuilder {
        EventBrokerBuilder::default()
    }

    pub fn from_config(config: &BrokerConfig) -> Self {
        Self::builder()
            .max_listeners(config.max_listeners)
            .metrics(config.metrics)
            .build()
    }

    // ── Subscribe ──────────────────────────────────────────────────

    /// Register a listener for `E::KIND`.
    ///
    /// The payload type picks the kind, so the body can only ever be bound
    /// to the matching payload shape.
    pub fn subscribe<E, F, R>(&self, f: F) -> Subscription
    where
        E: DomainEvent,
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: ListenerOutcome + 'static,
    {
        self.subscribe_listener(Listener::from_fn(f))
    }

    /// Register a listener handle. Registering the same handle twice yields
    /// two entries, each invoked on every publish.
    pub fn subscribe_listener<E: DomainEvent>(&self, listener: Listener<E>) -> Subscription {
        let entry = Entry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(listener.name()),
            identity: listener.identity(),
            handler: listener.erase(),
        };
        self.insert(E::KIND, entry)
    }

    /// Register a listener whose work completes later.
    ///
    /// The broker clones the payload, spawns the returned future on the
    /// current tokio runtime and moves on without awaiting it. Completion
    /// order across async listeners is unspecified. Failures inside the
    /// spawned task go to the observers; a missing runtime fails the
    /// invocation itself.
    pub fn subscribe_async<E, F, Fut, R>(&self, name: impl Into<String>, f: F) -> Subscription
    where
        E: DomainEvent,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: ListenerOutcome + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name: String = name.into();
        let observers = Arc::clone(&self.observers);
        let listener_name = name.clone();

        let listener = Listener::new(name, move |payload: &E| {
            let runtime = tokio::runtime::Handle::try_current()?;
            let future = AssertUnwindSafe(f(payload.clone())).catch_unwind();
            let observers = Arc::clone(&observers);
            let listener_name = listener_name.clone();

            runtime.spawn(async move {
                let cause = match future.await {
                    Ok(outcome) => match outcome.into_result() {
                        Ok(()) => return,
                        Err(e) => FailureCause::Error(e.to_string()),
                    },
                    Err(panic) => FailureCause::from_panic(panic.as_ref()),
                };
                let failure = ListenerFailure {
                    kind: E::KIND,
                    subscription_id: id,
                    listener: listener_name,
                    cause,
                };
                notify(&observers, |o| o.on_listener_failure(&failure));
            });
            Ok::<(), tokio::runtime::TryCurrentError>(())
        });

        let entry = Entry {
            id,
            name: Arc::from(listener.name()),
            identity: listener.identity(),
            handler: listener.erase(),
        };
        self.insert(E::KIND, entry)
    }

    fn insert(&self, kind: EventKind, entry: Entry) -> Subscription {
        let subscription = Subscription::new(kind, entry.id, Arc::clone(&entry.name));
        let (count, exceeded) = {
            let mut listeners = self.registry.entry(kind).or_default();
            listeners.push(Arc::new(entry));
            let count = listeners.len();
            (count, self.mark_overflow(kind, count))
        };

        debug!(
            %kind,
            subscription_id = subscription.id(),
            listener = subscription.listener_name(),
            listeners = count,
            "Listener subscribed"
        );
        if let Some(max) = exceeded {
            notify(&self.observers, |o| o.on_listener_overflow(kind, count, max));
        }
        subscription
    }

    // ── Unsubscribe ────────────────────────────────────────────────

    /// Cancel one subscription. Returns `false` when it was not registered.
    ///
    /// A dispatch already in progress is not affected.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.remove_first(subscription.kind(), |entry| entry.id == subscription.id())
    }

    /// Remove the first entry for `E::KIND` registered with this handle,
    /// keeping the order of the rest. Returns `false` when absent.
    pub fn remove_listener<E: DomainEvent>(&self, listener: &Listener<E>) -> bool {
        let identity = listener.identity();
        self.remove_first(E::KIND, |entry| entry.identity == identity)
    }

    /// Drop every listener for `kind`; returns how many were removed.
    pub fn remove_all_listeners(&self, kind: EventKind) -> usize {
        let removed = match self.registry.get_mut(&kind) {
            Some(mut listeners) => {
                self.overflowed.remove(&kind);
                std::mem::take(&mut *listeners).len()
            }
            None => 0,
        };
        if removed > 0 {
            debug!(%kind, removed, "Listeners removed");
        }
        removed
    }

    /// Drop every listener of every kind.
    pub fn clear(&self) {
        for mut listeners in self.registry.iter_mut() {
            listeners.clear();
            self.overflowed.remove(listeners.key());
        }
    }

    fn remove_first(&self, kind: EventKind, matches: impl Fn(&Entry) -> bool) -> bool {
        let Some(mut listeners) = self.registry.get_mut(&kind) else {
            return false;
        };
        let Some(index) = listeners.iter().position(|entry| matches(entry.as_ref())) else {
            return false;
        };

        let entry = listeners.remove(index);
        self.rearm_overflow(kind, listeners.len());
        debug!(
            %kind,
            subscription_id = entry.id,
            listener = %entry.name,
            "Listener unsubscribed"
        );
        true
    }

    // ── Publish ────────────────────────────────────────────────────

    /// Deliver `payload` to every listener of `E::KIND`, in registration
    /// order, on the calling thread.
    ///
    /// Emits one observability record even when nobody listens. Never
    /// fails: listener errors and panics are contained and summarized in
    /// the returned report.
    pub fn publish<E: DomainEvent>(&self, payload: E) -> DeliveryReport {
        let kind = E::KIND;
        let listeners = self.snapshot(kind);
        let record = EventRecord::new(&payload);
        notify(&self.observers, |o| o.on_publish(&record, listeners.len()));

        let mut report = DeliveryReport::new(record.id, kind);
        let payload: &dyn Any = &payload;
        for entry in listeners.iter() {
            let cause = match panic::catch_unwind(AssertUnwindSafe(|| (entry.handler)(payload))) {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(FailureCause::Error(e.to_string())),
                Err(panic) => Some(FailureCause::from_panic(panic.as_ref())),
            };

            let failure = cause.map(|cause| ListenerFailure {
                kind,
                subscription_id: entry.id,
                listener: entry.name.to_string(),
                cause,
            });
            if let Some(failure) = &failure {
                notify(&self.observers, |o| o.on_listener_failure(failure));
            }
            report.record_delivery(failure);
        }

        report
    }

    /// Publish an event whose kind is only known at runtime.
    pub fn publish_event(&self, event: Event) -> DeliveryReport {
        match event {
            Event::UserRegistered(p) => self.publish(p),
            Event::UserDeleted(p) => self.publish(p),
            Event::OrderCreated(p) => self.publish(p),
            Event::OrderPaid(p) => self.publish(p),
            Event::OrderCancelled(p) => self.publish(p),
            Event::ProductLowStock(p) => self.publish(p),
            Event::ProductOutOfStock(p) => self.publish(p),
            Event::InventoryRestocked(p) => self.publish(p),
            Event::CacheCleared(p) => self.publish(p),
        }
    }

    fn snapshot(&self, kind: EventKind) -> Vec<Arc<Entry>> {
        self.registry
            .get(&kind)
            .map(|listeners| listeners.value().clone())
            .unwrap_or_default()
    }

    // ── Introspection ──────────────────────────────────────────────

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry.get(&kind).map(|l| l.len()).unwrap_or(0)
    }

    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.listener_count(kind) > 0
    }

    /// Kinds with at least one listener, in catalog order.
    pub fn kinds_with_listeners(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.has_listeners(*kind))
            .collect()
    }

    /// Names of the listeners for `kind`, in dispatch order.
    pub fn listener_names(&self, kind: EventKind) -> Vec<String> {
        self.snapshot(kind)
            .iter()
            .map(|entry| entry.name.to_string())
            .collect()
    }

    // ── Leak warning ───────────────────────────────────────────────

    /// Soft cap on listeners per kind; `0` disables the warning.
    pub fn max_listeners(&self) -> usize {
        self.max_listeners.load(Ordering::Relaxed)
    }

    /// Change the cap. Every kind is re-armed, so the next subscribe to a
    /// kind already above the new cap warns again.
    pub fn set_max_listeners(&self, max: usize) {
        self.max_listeners.store(max, Ordering::Relaxed);
        self.overflowed.clear();
    }

    // Both helpers below run with the kind's registry guard held, so the
    // flag always matches the count it was computed from.

    /// Returns the cap when `count` newly exceeds it. Warns once per kind
    /// until the count falls back under the cap.
    fn mark_overflow(&self, kind: EventKind, count: usize) -> Option<usize> {
        let max = self.max_listeners();
        if max == 0 || count <= max {
            return None;
        }
        self.overflowed.insert(kind, ()).is_none().then_some(max)
    }

    fn rearm_overflow(&self, kind: EventKind, count: usize) {
        let max = self.max_listeners();
        if max == 0 || count <= max {
            self.overflowed.remove(&kind);
        }
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let observers: Vec<_> = self.observers.iter().map(|o| o.name()).collect();
        f.debug_struct("EventBroker")
            .field("kinds", &self.kinds_with_listeners())
            .field("max_listeners", &self.max_listeners())
            .field("observers", &observers)
            .finish()
    }
}

/// Run `f` against every observer, containing observer panics.
fn notify(observers: &Observers, f: impl Fn(&dyn PublishObserver)) {
    for observer in observers.iter() {
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))) {
            tracing::error!(
                observer = observer.name(),
                error = %FailureCause::from_panic(panic.as_ref()),
                "Publish observer panicked"
            );
        }
    }
}

// ── Builder ────────────────────────────────────────────────────────

pub struct EventBrokerBuilder {
    max_listeners: usize,
    metrics: bool,
    observers: Vec<Arc<dyn PublishObserver>>,
}

impl Default for EventBrokerBuilder {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
            metrics: false,
            observers: Vec::new(),
        }
    }
}

impl EventBrokerBuilder {
    pub fn max_listeners(mut self, max: usize) -> Self {
        self.max_listeners = max;
        self
    }

    pub fn metrics(mut self, enabled: bool) -> Self {
        self.metrics = enabled;
        self
    }

    /// Attach an extra observer after the built-in ones.
    pub fn observer(mut self, observer: Arc<dyn PublishObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> EventBroker {
        let mut observers: Vec<Arc<dyn PublishObserver>> = vec![Arc::new(TracingObserver)];
        if self.metrics {
            observers.push(Arc::new(MetricsObserver));
        }
        observers.extend(self.observers);

        EventBroker {
            registry: DashMap::new(),
            observers: Arc::new(observers),
            max_listeners: AtomicUsize::new(self.max_listeners),
            overflowed: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

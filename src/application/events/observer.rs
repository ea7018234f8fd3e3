//! Observability sinks for the broker
//!
//! Every publish produces one [`EventRecord`], listener or not. Observers
//! receive that record plus listener failures and leak warnings. The broker
//! always carries a [`TracingObserver`]; [`MetricsObserver`] is attached
//! when enabled in config.

use tracing::{error, info, warn};

use super::report::ListenerFailure;
use crate::domain::events::{EventKind, EventRecord};

pub trait PublishObserver: Send + Sync + 'static {
    /// Called once per publish, before any listener runs.
    fn on_publish(&self, record: &EventRecord, listeners: usize);

    fn on_listener_failure(&self, _failure: &ListenerFailure) {}

    /// The listener count for `kind` went above the soft cap.
    fn on_listener_overflow(&self, _kind: EventKind, _listeners: usize, _max_listeners: usize) {}

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Writes structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PublishObserver for TracingObserver {
    fn on_publish(&self, record: &EventRecord, listeners: usize) {
        info!(
            target: "event_broker::publish",
            event_id = %record.id,
            kind = %record.kind,
            listeners,
            payload = %record.payload,
            "Event published"
        );
    }

    fn on_listener_failure(&self, failure: &ListenerFailure) {
        error!(
            target: "event_broker::dispatch",
            kind = %failure.kind,
            subscription_id = failure.subscription_id,
            listener = %failure.listener,
            cause = failure.cause.as_label(),
            error = %failure.cause.message(),
            "Listener failed"
        );
    }

    fn on_listener_overflow(&self, kind: EventKind, listeners: usize, max_listeners: usize) {
        warn!(
            target: "event_broker::registry",
            %kind,
            listeners,
            max_listeners,
            "Possible listener leak: more listeners than the configured limit"
        );
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// Feeds the `metrics` facade; whichever recorder the host installs picks it up.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl PublishObserver for MetricsObserver {
    fn on_publish(&self, record: &EventRecord, listeners: usize) {
        metrics::counter!("events_published_total", "kind" => record.kind.as_str()).increment(1);
        if listeners == 0 {
            metrics::counter!("events_unobserved_total", "kind" => record.kind.as_str())
                .increment(1);
        }
    }

    fn on_listener_failure(&self, failure: &ListenerFailure) {
        metrics::counter!(
            "event_listener_failures_total",
            "kind" => failure.kind.as_str(),
            "cause" => failure.cause.as_label()
        )
        .increment(1);
    }

    fn on_listener_overflow(&self, kind: EventKind, listeners: usize, _max_listeners: usize) {
        metrics::gauge!("event_listeners_over_limit", "kind" => kind.as_str()).set(listeners as f64);
    }

    fn name(&self) -> &'static str {
        "metrics"
    }
}

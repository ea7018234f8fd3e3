//! Delivery outcome of a single publish

use std::any::Any;

use serde::Serialize;
use thiserror::Error;

use crate::domain::events::EventKind;

/// Why a listener invocation did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum FailureCause {
    /// The listener returned `Err`.
    Error(String),
    /// The listener panicked; the panic was contained by the broker.
    Panic(String),
}

impl FailureCause {
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        FailureCause::Panic(message)
    }

    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailureCause::Error(_) => "listener_error",
            FailureCause::Panic(_) => "listener_panic",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FailureCause::Error(msg) | FailureCause::Panic(msg) => msg,
        }
    }
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCause::Error(msg) => write!(f, "error: {msg}"),
            FailureCause::Panic(msg) => write!(f, "panic: {msg}"),
        }
    }
}

/// One listener that failed while handling a publish.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("listener '{listener}' failed on {kind}: {cause}")]
pub struct ListenerFailure {
    pub kind: EventKind,
    pub subscription_id: u64,
    pub listener: String,
    pub cause: FailureCause,
}

/// Summary returned by every publish.
///
/// A report never signals an error to the publisher by itself; callers may
/// inspect [`failures`](Self::failures) to log or ignore partial failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    event_id: String,
    kind: EventKind,
    delivered: usize,
    failures: Vec<ListenerFailure>,
}

impl DeliveryReport {
    pub(crate) fn new(event_id: String, kind: EventKind) -> Self {
        Self {
            event_id,
            kind,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    pub(crate) fn record_delivery(&mut self, failure: Option<ListenerFailure>) {
        self.delivered += 1;
        if let Some(failure) = failure {
            self.failures.push(failure);
        }
    }

    /// Id of the observability record emitted for this publish.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Number of listeners invoked, failed ones included.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Number of listeners that completed without failing.
    pub fn succeeded(&self) -> usize {
        self.delivered - self.failures.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[ListenerFailure] {
        &self.failures
    }

    /// No listener was registered for the kind at publish time.
    pub fn is_empty(&self) -> bool {
        self.delivered == 0
    }

    /// Every invoked listener completed normally (vacuously true when empty).
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

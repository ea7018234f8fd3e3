//! Application events (pub/sub)
//!
//! Event types are defined in `domain::events`. The broker that dispatches
//! them to in-process listeners lives here.

pub mod broker;
pub mod listener;
pub mod observer;
pub mod report;

pub use broker::{
    create_event_broker, EventBroker, EventBrokerBuilder, SharedEventBroker,
    DEFAULT_MAX_LISTENERS,
};
pub use listener::{Listener, ListenerError, ListenerOutcome, ListenerResult, Subscription};
pub use observer::{MetricsObserver, PublishObserver, TracingObserver};
pub use report::{DeliveryReport, FailureCause, ListenerFailure};

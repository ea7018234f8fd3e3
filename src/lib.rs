//! # Event Broker
//!
//! In-process, typed publish/subscribe for backend modules (users, orders,
//! inventory, notifications, analytics) that must not call each other
//! directly.
//!
//! ## Architecture
//!
//! - **domain**: the closed catalog of event kinds and their payloads
//! - **application**: the broker, listener handles, delivery reports and
//!   observability sinks
//! - **config**: TOML configuration
//! - **bootstrap**: logging setup for the binary
//!
//! ## Usage
//! ```
//! use event_broker::{create_event_broker, BrokerConfig, OrderCreatedEvent};
//!
//! let broker = create_event_broker(&BrokerConfig::default());
//!
//! // Consumers bind to a payload type, which fixes the kind.
//! broker.subscribe(|order: &OrderCreatedEvent| {
//!     println!("order {} created", order.order_id);
//! });
//!
//! // Producers publish a payload; delivery is synchronous and ordered.
//! let report = broker.publish(OrderCreatedEvent::new("o1"));
//! assert_eq!(report.delivered(), 1);
//! ```

pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;

pub use config::{default_config_path, AppConfig, BrokerConfig, LoggingConfig};

pub use application::events::{
    create_event_broker, DeliveryReport, EventBroker, EventBrokerBuilder, FailureCause, Listener,
    ListenerError, ListenerFailure, ListenerOutcome, MetricsObserver, PublishObserver,
    SharedEventBroker, Subscription, TracingObserver, DEFAULT_MAX_LISTENERS,
};
pub use domain::events::{
    CacheClearedEvent, DomainEvent, Event, EventKind, EventRecord, InventoryRestockedEvent,
    OrderCancelledEvent, OrderCreatedEvent, OrderLine, OrderPaidEvent, ProductLowStockEvent,
    ProductOutOfStockEvent, UserDeletedEvent, UserRegisteredEvent, CATALOG_VERSION,
};
pub use domain::{BrokerError, BrokerResult, ConfigError};

//! Domain events
//!
//! The closed catalog of event kinds and the payload carried by each.
//! The broker that dispatches them lives in `application::events`.

pub mod kind;
pub mod types;

pub use kind::{EventKind, CATALOG_VERSION};
pub use types::{
    CacheClearedEvent, DomainEvent, Event, EventRecord, InventoryRestockedEvent,
    OrderCancelledEvent, OrderCreatedEvent, OrderLine, OrderPaidEvent, ProductLowStockEvent,
    ProductOutOfStockEvent, UserDeletedEvent, UserRegisteredEvent,
};

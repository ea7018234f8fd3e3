//! Domain event payloads
//!
//! One payload struct per [`EventKind`]. Each implements [`DomainEvent`],
//! which ties the struct to its kind at the type level, so a listener for
//! `OrderCreatedEvent` can only ever be bound to `order.created`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::kind::EventKind;
use crate::domain::error::{BrokerError, BrokerResult};

mod sealed {
    pub trait Sealed {}
}

/// A payload type bound to exactly one [`EventKind`].
///
/// Sealed: only the catalog payloads in this module implement it, so no
/// outside type can claim an existing kind.
///
/// ```compile_fail
/// use event_broker::{DomainEvent, Event, EventKind};
///
/// #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
/// struct Impostor;
///
/// impl DomainEvent for Impostor {
///     const KIND: EventKind = EventKind::OrderCreated;
///
///     fn into_event(self) -> Event {
///         unreachable!()
///     }
/// }
/// ```
pub trait DomainEvent:
    sealed::Sealed + Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    const KIND: EventKind;

    fn into_event(self) -> Event;
}

macro_rules! domain_event {
    ($($payload:ident => $kind:ident),+ $(,)?) => {
        $(
            impl sealed::Sealed for $payload {}

            impl DomainEvent for $payload {
                const KIND: EventKind = EventKind::$kind;

                fn into_event(self) -> Event {
                    Event::$kind(self)
                }
            }

            impl From<$payload> for Event {
                fn from(payload: $payload) -> Self {
                    Event::$kind(payload)
                }
            }
        )+
    };
}

domain_event! {
    UserRegisteredEvent => UserRegistered,
    UserDeletedEvent => UserDeleted,
    OrderCreatedEvent => OrderCreated,
    OrderPaidEvent => OrderPaid,
    OrderCancelledEvent => OrderCancelled,
    ProductLowStockEvent => ProductLowStock,
    ProductOutOfStockEvent => ProductOutOfStock,
    InventoryRestockedEvent => InventoryRestocked,
    CacheClearedEvent => CacheCleared,
}

/// Any event in the catalog, for producers that only know the kind at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Event {
    #[serde(rename = "user.registered")]
    UserRegistered(UserRegisteredEvent),
    #[serde(rename = "user.deleted")]
    UserDeleted(UserDeletedEvent),
    #[serde(rename = "order.created")]
    OrderCreated(OrderCreatedEvent),
    #[serde(rename = "order.paid")]
    OrderPaid(OrderPaidEvent),
    #[serde(rename = "order.cancelled")]
    OrderCancelled(OrderCancelledEvent),
    #[serde(rename = "product.low_stock")]
    ProductLowStock(ProductLowStockEvent),
    #[serde(rename = "product.out_of_stock")]
    ProductOutOfStock(ProductOutOfStockEvent),
    #[serde(rename = "inventory.restocked")]
    InventoryRestocked(InventoryRestockedEvent),
    #[serde(rename = "cache.cleared")]
    CacheCleared(CacheClearedEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::UserRegistered(_) => EventKind::UserRegistered,
            Event::UserDeleted(_) => EventKind::UserDeleted,
            Event::OrderCreated(_) => EventKind::OrderCreated,
            Event::OrderPaid(_) => EventKind::OrderPaid,
            Event::OrderCancelled(_) => EventKind::OrderCancelled,
            Event::ProductLowStock(_) => EventKind::ProductLowStock,
            Event::ProductOutOfStock(_) => EventKind::ProductOutOfStock,
            Event::InventoryRestocked(_) => EventKind::InventoryRestocked,
            Event::CacheCleared(_) => EventKind::CacheCleared,
        }
    }

    /// Build an event from a wire kind name and a JSON payload.
    ///
    /// Fails with [`BrokerError::UnknownKind`] for names outside the catalog
    /// and [`BrokerError::InvalidPayload`] when the payload shape does not
    /// match the kind.
    pub fn from_json(kind: &str, payload: serde_json::Value) -> BrokerResult<Self> {
        fn decode<E: DomainEvent>(payload: serde_json::Value) -> BrokerResult<Event> {
            serde_json::from_value::<E>(payload)
                .map(DomainEvent::into_event)
                .map_err(|source| BrokerError::InvalidPayload {
                    kind: E::KIND,
                    source,
                })
        }

        match kind.parse::<EventKind>()? {
            EventKind::UserRegistered => decode::<UserRegisteredEvent>(payload),
            EventKind::UserDeleted => decode::<UserDeletedEvent>(payload),
            EventKind::OrderCreated => decode::<OrderCreatedEvent>(payload),
            EventKind::OrderPaid => decode::<OrderPaidEvent>(payload),
            EventKind::OrderCancelled => decode::<OrderCancelledEvent>(payload),
            EventKind::ProductLowStock => decode::<ProductLowStockEvent>(payload),
            EventKind::ProductOutOfStock => decode::<ProductOutOfStockEvent>(payload),
            EventKind::InventoryRestocked => decode::<InventoryRestockedEvent>(payload),
            EventKind::CacheCleared => decode::<CacheClearedEvent>(payload),
        }
    }
}

// ── Users ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegisteredEvent {
    pub user_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeletedEvent {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ── Orders ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedEvent {
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub total_cents: u64,
}

impl OrderCreatedEvent {
    /// Bare order with no lines, mostly useful for tests and fixtures.
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            user_id: None,
            items: Vec::new(),
            total_cents: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPaidEvent {
    pub order_id: String,
    pub amount_cents: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancelledEvent {
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ── Inventory ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLowStockEvent {
    pub product_id: String,
    pub remaining: u32,
    pub threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOutOfStockEvent {
    pub product_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRestockedEvent {
    pub product_id: String,
    pub quantity: u32,
    pub new_level: u32,
}

// ── Admin ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearedEvent {
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

/// Structured record emitted to the observability sink for every publish
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl EventRecord {
    pub fn new<E: DomainEvent>(payload: &E) -> Self {
        let payload = serde_json::to_value(payload).unwrap_or_else(|e| {
            serde_json::json!({ "unserializable": e.to_string() })
        });
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: E::KIND,
            timestamp: Utc::now(),
            payload,
        }
    }
}

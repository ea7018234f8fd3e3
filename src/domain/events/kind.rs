//! Closed catalog of event kinds
//!
//! Every kind is a namespaced `domain.action` name. The set is fixed at
//! compile time; adding a kind is backward compatible, changing the payload
//! shape of an existing kind is not (bump [`CATALOG_VERSION`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::BrokerError;

/// Version of the kind/payload contract between producers and consumers.
pub const CATALOG_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "user.registered")]
    UserRegistered,
    #[serde(rename = "user.deleted")]
    UserDeleted,
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.paid")]
    OrderPaid,
    #[serde(rename = "order.cancelled")]
    OrderCancelled,
    #[serde(rename = "product.low_stock")]
    ProductLowStock,
    #[serde(rename = "product.out_of_stock")]
    ProductOutOfStock,
    #[serde(rename = "inventory.restocked")]
    InventoryRestocked,
    #[serde(rename = "cache.cleared")]
    CacheCleared,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::UserRegistered,
        EventKind::UserDeleted,
        EventKind::OrderCreated,
        EventKind::OrderPaid,
        EventKind::OrderCancelled,
        EventKind::ProductLowStock,
        EventKind::ProductOutOfStock,
        EventKind::InventoryRestocked,
        EventKind::CacheCleared,
    ];

    /// Wire name, e.g. `order.created`
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::UserRegistered => "user.registered",
            EventKind::UserDeleted => "user.deleted",
            EventKind::OrderCreated => "order.created",
            EventKind::OrderPaid => "order.paid",
            EventKind::OrderCancelled => "order.cancelled",
            EventKind::ProductLowStock => "product.low_stock",
            EventKind::ProductOutOfStock => "product.out_of_stock",
            EventKind::InventoryRestocked => "inventory.restocked",
            EventKind::CacheCleared => "cache.cleared",
        }
    }

    /// The `domain` half of the wire name.
    pub fn domain(&self) -> &'static str {
        match self.as_str().split_once('.') {
            Some((domain, _)) => domain,
            None => self.as_str(),
        }
    }

    /// Rust name of the payload type carried by this kind.
    pub fn payload_type(&self) -> &'static str {
        match self {
            EventKind::UserRegistered => "UserRegisteredEvent",
            EventKind::UserDeleted => "UserDeletedEvent",
            EventKind::OrderCreated => "OrderCreatedEvent",
            EventKind::OrderPaid => "OrderPaidEvent",
            EventKind::OrderCancelled => "OrderCancelledEvent",
            EventKind::ProductLowStock => "ProductLowStockEvent",
            EventKind::ProductOutOfStock => "ProductOutOfStockEvent",
            EventKind::InventoryRestocked => "InventoryRestockedEvent",
            EventKind::CacheCleared => "CacheClearedEvent",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BrokerError::UnknownKind {
                kind: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn wire_names_are_namespaced_and_unique() {
        let mut names: Vec<_> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert!(names.iter().all(|n| n.split('.').count() == 2));
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EventKind::ALL.len());
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "order.teleported".parse::<EventKind>().unwrap_err();
        assert!(matches!(err, BrokerError::UnknownKind { ref kind } if kind == "order.teleported"));
        assert!("ORDER.CREATED".parse::<EventKind>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&EventKind::ProductLowStock).unwrap();
        assert_eq!(json, "\"product.low_stock\"");
        let kind: EventKind = serde_json::from_str("\"cache.cleared\"").unwrap();
        assert_eq!(kind, EventKind::CacheCleared);
    }

    #[test]
    fn domain_is_prefix() {
        assert_eq!(EventKind::OrderCancelled.domain(), "order");
        assert_eq!(EventKind::InventoryRestocked.domain(), "inventory");
    }
}

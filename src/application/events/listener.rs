//! Listener handles and subscriptions

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::domain::events::{DomainEvent, EventKind};

/// Error returned by a failing listener.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type ListenerResult = Result<(), ListenerError>;

/// What a listener body may return: `()` or `Result<(), E>`.
pub trait ListenerOutcome {
    fn into_result(self) -> ListenerResult;
}

impl ListenerOutcome for () {
    fn into_result(self) -> ListenerResult {
        Ok(())
    }
}

impl<E> ListenerOutcome for Result<(), E>
where
    E: Into<ListenerError>,
{
    fn into_result(self) -> ListenerResult {
        self.map_err(Into::into)
    }
}

type Handler<E> = dyn Fn(&E) -> ListenerResult + Send + Sync;

/// Named, cheaply cloneable callback for payloads of type `E`.
///
/// Clones share identity: subscribing the same `Listener` twice registers
/// two independent entries, and [`EventBroker::remove_listener`] removes
/// entries by that identity.
///
/// [`EventBroker::remove_listener`]: super::EventBroker::remove_listener
pub struct Listener<E> {
    name: Arc<str>,
    handler: Arc<Handler<E>>,
}

impl<E: DomainEvent> Listener<E> {
    pub fn new<F, R>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: ListenerOutcome + 'static,
    {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            handler: Arc::new(move |payload: &E| f(payload).into_result()),
        }
    }

    /// Listener named after the closure's type.
    pub fn from_fn<F, R>(f: F) -> Self
    where
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: ListenerOutcome + 'static,
    {
        Self::new(std::any::type_name::<F>(), f)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EventKind {
        E::KIND
    }

    /// True when both handles refer to the same registered callback.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.handler) as *const () as usize
    }

    pub(crate) fn call(&self, payload: &E) -> ListenerResult {
        (self.handler)(payload)
    }

    /// Erase the payload type so the registry can store any kind.
    pub(crate) fn erase(&self) -> Arc<ErasedHandler> {
        let listener = self.clone();
        Arc::new(move |payload: &dyn Any| match payload.downcast_ref::<E>() {
            Some(payload) => listener.call(payload),
            None => Err(format!(
                "payload is not a {}",
                std::any::type_name::<E>()
            )
            .into()),
        })
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<E> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("name", &self.name).finish()
    }
}

pub(crate) type ErasedHandler = dyn Fn(&dyn Any) -> ListenerResult + Send + Sync;

/// Registry entry: one (kind, listener) pair.
pub(crate) struct Entry {
    pub(crate) id: u64,
    pub(crate) name: Arc<str>,
    pub(crate) identity: usize,
    pub(crate) handler: Arc<ErasedHandler>,
}

/// Handle to one registered listener, used to cancel it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
    listener: Arc<str>,
}

impl Subscription {
    pub(crate) fn new(kind: EventKind, id: u64, listener: Arc<str>) -> Self {
        Self { kind, id, listener }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn listener_name(&self) -> &str {
        &self.listener
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{OrderCreatedEvent, ProductLowStockEvent};

    #[test]
    fn unit_and_result_bodies_both_compile_to_listener_results() {
        let ok = Listener::<OrderCreatedEvent>::new("ok", |_| {});
        let failing = Listener::<OrderCreatedEvent>::new("failing", |_| -> Result<(), String> {
            Err("boom".to_string())
        });

        let payload = OrderCreatedEvent::new("o1");
        assert!(ok.call(&payload).is_ok());
        assert_eq!(failing.call(&payload).unwrap_err().to_string(), "boom");
    }

    #[test]
    fn clones_share_identity() {
        let a = Listener::<OrderCreatedEvent>::new("a", |_| {});
        let b = Listener::<OrderCreatedEvent>::new("a", |_| {});

        assert!(a.same_as(&a.clone()));
        assert_eq!(a.identity(), a.clone().identity());
        assert!(!a.same_as(&b));
    }

    #[test]
    fn erased_handler_downcasts_payload() {
        let listener = Listener::<ProductLowStockEvent>::new("stock", |p| {
            if p.remaining < p.threshold {
                Ok(())
            } else {
                Err("not low")
            }
        });
        let erased = listener.erase();

        let low = ProductLowStockEvent {
            product_id: "sku-1".into(),
            remaining: 1,
            threshold: 5,
        };
        assert!(erased(&low as &dyn Any).is_ok());
        assert!(erased(&OrderCreatedEvent::new("o1") as &dyn Any).is_err());
    }

    #[test]
    fn from_fn_uses_type_name_and_kind() {
        let listener = Listener::<OrderCreatedEvent>::from_fn(|_| {});
        assert!(listener.name().contains("closure"));
        assert_eq!(listener.kind(), EventKind::OrderCreated);
    }
}

pub mod error;
pub mod events;

pub use error::{BrokerError, BrokerResult, ConfigError};
pub use events::{DomainEvent, Event, EventKind, EventRecord};

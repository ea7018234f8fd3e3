pub mod events;

pub use events::{
    create_event_broker, DeliveryReport, EventBroker, Listener, SharedEventBroker, Subscription,
};

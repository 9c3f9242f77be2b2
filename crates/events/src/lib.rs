//! Domain event abstractions: the `Event` trait, the stream envelope and a
//! lightweight pub/sub bus for distributing committed events to projections.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};

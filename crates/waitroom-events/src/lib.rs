pub mod bus;
pub mod controller_adapter;
pub mod event;

pub use bus::{EventBus, EventSubscriber};
pub use controller_adapter::BusPublisher;
pub use event::{Event, EventKind};

//! Push channel: one actor per live websocket connection, fanned out via
//! a [`PushRegistry`] that bridges `waitroom-events`' bus into group-scoped
//! [`ServerMessage`] deliveries. See `/queuehub` in `waitroom-api` for the
//! transport that owns the actual socket.

pub mod bridge;
pub mod connection;
pub mod error;
pub mod group;
pub mod ids;
pub mod messages;
pub mod registry;

pub use connection::{ConnectionCommand, ConnectionEngine, ConnectionHandle, ConnectionLiveness};
pub use error::PushError;
pub use group::GroupKey;
pub use ids::ConnectionId;
pub use messages::{ClientMessage, ServerMessage};
pub use registry::{PushRegistry, PushRegistryConfig};

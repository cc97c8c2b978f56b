//! One actor per live client connection, the same command-channel/handle
//! split `waitroom_core::controller` uses for the release controller: all
//! mutable state (subscriptions, liveness) lives inside the spawned task,
//! and [`ConnectionHandle`] is a cheap, cloneable front for it.

mod command;
mod engine;
mod handle;
mod state;

pub use command::ConnectionCommand;
pub use engine::ConnectionEngine;
pub use handle::ConnectionHandle;
pub use state::ConnectionLiveness;

pub mod queues;
pub mod sessions;
pub mod websocket;

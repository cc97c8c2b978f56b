pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod model;
pub mod schedule;
pub mod waiting_set;

pub use config::Config;
pub use error::EngineError;

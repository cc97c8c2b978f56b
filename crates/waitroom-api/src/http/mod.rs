pub mod controller_registry;
pub mod error;
pub mod handlers;
pub mod position_cache;
pub mod schema;
pub mod serve;
pub mod state;
pub mod tenant;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

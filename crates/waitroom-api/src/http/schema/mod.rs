pub mod queue;
pub mod session;

pub use queue::{AvailabilityQuery, AvailabilityResponse, CreateQueueRequest, QueueDto, UpdateQueueRequest};
pub use session::{EnqueueRequest, ReleaseRequest, ReleaseResponse, UserSessionDto};

pub mod ids;
pub mod ctx;
pub mod job;
pub mod keys;
pub mod events;

pub use ids::JobId;
pub use ctx::{QueueCtx, Trigger};
pub use job::Job;
pub use keys::KeySpace;
pub use events::QueueEvent;

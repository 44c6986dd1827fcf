pub mod ids;
pub mod task;
pub mod message;
pub mod record;
pub mod events;

pub use ids::JobId;
pub use task::TaskKind;
pub use message::JobMessage;
pub use record::{JobRecord, JobStatus};
pub use events::JobEvent;

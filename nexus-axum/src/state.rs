use std::sync::Arc;

use nexus_queue::QueueAdapter;

#[derive(Clone)]
pub struct NexusAxumState {
    pub queue: Arc<QueueAdapter>,
}

impl NexusAxumState {
    pub fn new(queue: QueueAdapter) -> Self {
        Self {
            queue: Arc::new(queue),
        }
    }
}

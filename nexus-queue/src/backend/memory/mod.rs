pub mod storage;

pub use storage::{MemoryJobQueue, MemoryJobStore};

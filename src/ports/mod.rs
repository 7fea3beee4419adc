pub mod repositories;
pub mod storage;

// Re-export all port traits for convenience
pub use repositories::AttachmentRepository;
pub use storage::{ObjectByteStream, ObjectStore};

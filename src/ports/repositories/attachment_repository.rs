use crate::domain::{errors::StorageResult, models::AttachmentRecord};
use async_trait::async_trait;
use uuid::Uuid;

/// Lookup of attachment records referenced from document text.
/// Persistence of the records themselves belongs to the caller.
#[async_trait]
pub trait AttachmentRepository: Send + Sync + 'static {
    /// Find an attachment by id
    async fn find_attachment(&self, id: &Uuid) -> StorageResult<Option<AttachmentRecord>>;
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    domain::{errors::StorageResult, models::AttachmentRecord},
    ports::repositories::AttachmentRepository,
};

/// In-memory implementation of AttachmentRepository for testing and development
#[derive(Clone, Default)]
pub struct InMemoryAttachmentRepository {
    records: Arc<RwLock<HashMap<Uuid, AttachmentRecord>>>,
}

impl InMemoryAttachmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: AttachmentRecord) {
        self.records.write().await.insert(record.id, record);
    }

    pub async fn remove(&self, id: &Uuid) -> Option<AttachmentRecord> {
        self.records.write().await.remove(id)
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryAttachmentRepository {
    async fn find_attachment(&self, id: &Uuid) -> StorageResult<Option<AttachmentRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }
}

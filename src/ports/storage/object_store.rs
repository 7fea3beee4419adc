use crate::domain::{
    errors::StorageResult,
    models::{ObjectInfo, PutObjectRequest},
    value_objects::ObjectKey,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Streaming body of a stored object
pub type ObjectByteStream = BoxStream<'static, StorageResult<Bytes>>;

/// Port for object storage operations
/// This abstracts the actual storage backend (S3, in-memory, etc.)
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Store object data under the request's key
    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<ObjectInfo>;

    /// Retrieve the whole object body
    async fn get_object(&self, key: &ObjectKey) -> StorageResult<Bytes>;

    /// Open a streaming read of the object body
    async fn get_object_stream(&self, key: &ObjectKey) -> StorageResult<ObjectByteStream>;

    /// Fetch object metadata without the body
    async fn head_object(&self, key: &ObjectKey) -> StorageResult<ObjectInfo>;

    /// Delete object data
    async fn delete_object(&self, key: &ObjectKey) -> StorageResult<()>;
}

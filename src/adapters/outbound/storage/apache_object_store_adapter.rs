use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::{
    path::Path as ObjectPath, Attribute, Attributes, GetOptions, GetResult,
    ObjectStore as ApacheObjectStore, PutOptions, PutPayload,
};
use std::sync::Arc;
use tracing::debug;

use super::error::map_store_error;
use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{ObjectInfo, PutObjectRequest},
        value_objects::ObjectKey,
    },
    ports::storage::{ObjectByteStream, ObjectStore},
};

/// Adapter that implements our ObjectStore trait using Apache object_store.
///
/// Canned ACLs are not expressible through object_store; this adapter stores
/// content type and disposition but leaves access control to the backend's
/// defaults.
#[derive(Clone)]
pub struct ApacheObjectStoreAdapter {
    inner: Arc<dyn ApacheObjectStore>,
}

impl ApacheObjectStoreAdapter {
    pub fn new(store: Arc<dyn ApacheObjectStore>) -> Self {
        Self { inner: store }
    }

    /// Store location of `key`, verbatim.
    ///
    /// `ObjectPath::from` would percent-encode characters such as `[` or `#`
    /// and store the object under a name that public and signed URLs never
    /// reach. Keys object_store cannot hold verbatim (`.` segments, a
    /// trailing `/`, control characters) are rejected instead.
    fn to_object_path(key: &ObjectKey) -> StorageResult<ObjectPath> {
        let path = ObjectPath::parse(key.as_str()).map_err(|e| StorageError::ValidationError {
            message: format!("Object key '{}' cannot be stored: {}", key, e),
        })?;

        if path.as_ref() != key.as_str() {
            return Err(StorageError::ValidationError {
                message: format!("Object key '{}' would be stored as '{}'", key, path),
            });
        }
        Ok(path)
    }

    fn info_from_result(key: &ObjectKey, result: &GetResult) -> ObjectInfo {
        let attribute = |name: &Attribute| result.attributes.get(name).map(|v| v.to_string());

        ObjectInfo {
            key: key.clone(),
            size: result.meta.size,
            etag: result.meta.e_tag.clone(),
            content_type: attribute(&Attribute::ContentType),
            content_disposition: attribute(&Attribute::ContentDisposition),
        }
    }
}

#[async_trait]
impl ObjectStore for ApacheObjectStoreAdapter {
    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<ObjectInfo> {
        let path = Self::to_object_path(&request.key)?;
        let size = request.body.len() as u64;

        let mut attributes = Attributes::new();
        if let Some(content_type) = &request.content_type {
            attributes.insert(Attribute::ContentType, content_type.clone().into());
        }
        if let Some(disposition) = &request.content_disposition {
            attributes.insert(Attribute::ContentDisposition, disposition.clone().into());
        }

        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result = self
            .inner
            .put_opts(&path, PutPayload::from(request.body), options)
            .await
            .map_err(|e| map_store_error(e, &request.key, "put"))?;

        debug!(key = %request.key, size, "Stored object");

        Ok(ObjectInfo {
            key: request.key,
            size,
            etag: result.e_tag,
            content_type: request.content_type,
            content_disposition: request.content_disposition,
        })
    }

    async fn get_object(&self, key: &ObjectKey) -> StorageResult<Bytes> {
        let path = Self::to_object_path(key)?;

        let result = self
            .inner
            .get(&path)
            .await
            .map_err(|e| map_store_error(e, key, "get"))?;

        result
            .bytes()
            .await
            .map_err(|e| map_store_error(e, key, "read"))
    }

    async fn get_object_stream(&self, key: &ObjectKey) -> StorageResult<ObjectByteStream> {
        let path = Self::to_object_path(key)?;

        let result = self
            .inner
            .get(&path)
            .await
            .map_err(|e| map_store_error(e, key, "get"))?;

        let stream_key = key.clone();
        Ok(result
            .into_stream()
            .map_err(move |e| map_store_error(e, &stream_key, "read"))
            .boxed())
    }

    async fn head_object(&self, key: &ObjectKey) -> StorageResult<ObjectInfo> {
        let path = Self::to_object_path(key)?;
        let options = GetOptions {
            head: true,
            ..Default::default()
        };

        let result = self
            .inner
            .get_opts(&path, options)
            .await
            .map_err(|e| map_store_error(e, key, "head"))?;

        Ok(Self::info_from_result(key, &result))
    }

    async fn delete_object(&self, key: &ObjectKey) -> StorageResult<()> {
        let path = Self::to_object_path(key)?;

        self.inner
            .delete(&path)
            .await
            .map_err(|e| map_store_error(e, key, "delete"))?;

        debug!(key = %key, "Deleted object");
        Ok(())
    }
}

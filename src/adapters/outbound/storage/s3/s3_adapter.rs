use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::{
    header::{CONTENT_DISPOSITION, CONTENT_TYPE, ETAG},
    Client,
};
use tracing::debug;
use url::Url;

use crate::{
    adapters::outbound::{
        signing::{object_url, RequestSigner},
        storage::{apache_object_store_adapter::ApacheObjectStoreAdapter, error::map_status_error},
    },
    domain::{
        errors::{StorageError, StorageResult},
        models::{ObjectInfo, PutObjectRequest},
        value_objects::{CannedAcl, ObjectKey},
    },
    ports::storage::{ObjectByteStream, ObjectStore},
};

/// Lifetime of the presigned URL used for a single ACL-carrying write
const ACL_PUT_EXPIRY_SECS: u64 = 300;

/// S3 storage adapter that implements the ObjectStore trait.
///
/// Reads, deletes and `private` writes go through object_store. Writes with
/// any other canned ACL are sent as a presigned PUT carrying `x-amz-acl`,
/// which object_store has no way to express.
#[derive(Clone)]
pub struct S3ObjectStoreAdapter {
    base: ApacheObjectStoreAdapter,
    bucket_url: Url,
    signer: Option<RequestSigner>,
    http: Client,
}

impl S3ObjectStoreAdapter {
    pub fn new(
        base: ApacheObjectStoreAdapter,
        bucket_url: Url,
        signer: Option<RequestSigner>,
        http: Client,
    ) -> Self {
        Self {
            base,
            bucket_url,
            signer,
            http,
        }
    }

    async fn put_with_acl(&self, request: PutObjectRequest) -> StorageResult<ObjectInfo> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| StorageError::SigningUnavailable {
                reason: format!(
                    "canned ACL '{}' requires static credentials",
                    request.acl
                ),
            })?;

        let url = object_url(&self.bucket_url, &request.key);
        let signed = signer
            .presign_url(
                "PUT",
                &url,
                ACL_PUT_EXPIRY_SECS,
                &[("x-amz-acl", request.acl.as_str())],
                Utc::now(),
            )
            .ok_or_else(|| StorageError::SigningUnavailable {
                reason: format!("endpoint '{}' has no host", self.bucket_url),
            })?;

        let size = request.body.len() as u64;
        let mut builder = self.http.put(signed).body(request.body);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(disposition) = &request.content_disposition {
            builder = builder.header(CONTENT_DISPOSITION, disposition);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StorageError::StorageBackendError {
                operation: "put".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &body, &request.key, "put"));
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        debug!(key = %request.key, acl = %request.acl, size, "Stored object with canned ACL");

        Ok(ObjectInfo {
            key: request.key,
            size,
            etag,
            content_type: request.content_type,
            content_disposition: request.content_disposition,
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStoreAdapter {
    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<ObjectInfo> {
        match request.acl {
            CannedAcl::Private => self.base.put_object(request).await,
            _ => self.put_with_acl(request).await,
        }
    }

    async fn get_object(&self, key: &ObjectKey) -> StorageResult<Bytes> {
        self.base.get_object(key).await
    }

    async fn get_object_stream(&self, key: &ObjectKey) -> StorageResult<ObjectByteStream> {
        self.base.get_object_stream(key).await
    }

    async fn head_object(&self, key: &ObjectKey) -> StorageResult<ObjectInfo> {
        self.base.head_object(key).await
    }

    async fn delete_object(&self, key: &ObjectKey) -> StorageResult<()> {
        self.base.delete_object(key).await
    }
}

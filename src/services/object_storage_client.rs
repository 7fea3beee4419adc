use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::{
    adapters::outbound::{
        http::RemoteFetcher,
        signing::{object_url, RequestSigner},
    },
    domain::{
        errors::{StorageError, StorageResult},
        models::{
            ObjectInfo, PostCondition, PresignedPost, PutObjectRequest, StorageConfig,
            UploadDescriptor, ATTACHMENT_DISPOSITION, DEFAULT_CONTENT_TYPE_PREFIX,
            PRESIGNED_POST_EXPIRY_SECS,
        },
        value_objects::{CannedAcl, ObjectKey},
    },
    ports::storage::{ObjectByteStream, ObjectStore},
};

/// Default lifetime of a signed download URL
pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 60;

/// Sources under this prefix are already served by the application
const API_PATH_PREFIX: &str = "/api";

/// Namespace used for exported archives
const EXPORT_NAMESPACE: &str = "uploads";

/// Facade over the configured object store.
///
/// Keys and URLs are derived from a [`StorageConfig`] resolved once at
/// start-up. Cloning is cheap and clones share the same backend.
#[derive(Clone)]
pub struct ObjectStorageClient {
    config: Arc<StorageConfig>,
    store: Arc<dyn ObjectStore>,
    signer: Option<RequestSigner>,
    fetcher: RemoteFetcher,
}

impl ObjectStorageClient {
    pub fn new(config: StorageConfig, store: Arc<dyn ObjectStore>, fetcher: RemoteFetcher) -> Self {
        let signer = config
            .credentials()
            .map(|credentials| RequestSigner::new(credentials.clone(), config.region()));

        Self {
            config: Arc::new(config),
            store,
            signer,
            fetcher,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn signer(&self) -> StorageResult<&RequestSigner> {
        self.signer
            .as_ref()
            .ok_or_else(|| StorageError::SigningUnavailable {
                reason: "no static credentials configured".to_string(),
            })
    }

    /// Issue a fresh key `<namespace>/<owner>/<uuid>/<file label>`
    pub fn issue_key(
        &self,
        namespace: &str,
        owner_id: impl Display,
        file_label: &str,
    ) -> StorageResult<ObjectKey> {
        Ok(ObjectKey::issue(namespace, owner_id, file_label)?)
    }

    /// Issue a key for a team export archive named `<name>-export.zip`
    pub fn export_key(&self, team_id: impl Display, name: &str) -> StorageResult<ObjectKey> {
        self.issue_key(EXPORT_NAMESPACE, team_id, &format!("{}-export.zip", name))
    }

    /// Build a signed browser form upload for `key`.
    ///
    /// The form accepts at most `max_size` bytes, a content type starting
    /// with `content_type_prefix` (default `image`) and any cache-control
    /// value. Stored objects always get an attachment disposition.
    pub fn create_presigned_upload(
        &self,
        key: &ObjectKey,
        acl: CannedAcl,
        max_size: u64,
        content_type_prefix: Option<&str>,
    ) -> StorageResult<PresignedPost> {
        let signer = self.signer()?;

        let conditions = vec![
            PostCondition::ContentLengthRange {
                min: 0,
                max: max_size,
            },
            PostCondition::starts_with(
                "Content-Type",
                content_type_prefix.unwrap_or(DEFAULT_CONTENT_TYPE_PREFIX),
            ),
            PostCondition::starts_with("Cache-Control", ""),
        ];

        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), key.to_string());
        fields.insert("acl".to_string(), acl.to_string());
        fields.insert(
            "Content-Disposition".to_string(),
            ATTACHMENT_DISPOSITION.to_string(),
        );

        let post = signer.presign_post(
            self.config.public_bucket_endpoint(),
            self.config.bucket().as_str(),
            fields,
            conditions,
            PRESIGNED_POST_EXPIRY_SECS,
            Utc::now(),
        );

        debug!(key = %key, acl = %acl, max_size, "Created presigned upload");
        Ok(post)
    }

    /// Store a body directly and return its public URL
    pub async fn upload(&self, descriptor: UploadDescriptor) -> StorageResult<String> {
        let actual = descriptor.body.len() as u64;
        if descriptor.content_length != actual {
            return Err(StorageError::ContentLengthMismatch {
                key: descriptor.key,
                declared: descriptor.content_length,
                actual,
            });
        }

        let key = descriptor.key.clone();
        self.store
            .put_object(PutObjectRequest {
                key: descriptor.key,
                acl: descriptor.acl,
                content_type: Some(descriptor.content_type),
                content_disposition: Some(ATTACHMENT_DISPOSITION.to_string()),
                body: descriptor.body,
            })
            .await?;

        info!(key = %key, size = actual, "Uploaded object");
        Ok(self.config.public_object_url(&key))
    }

    /// Copy a remote file into the bucket under `key`.
    ///
    /// Sources under `/api` or already inside the public bucket are skipped.
    /// Failures are logged and reported as `None`.
    pub async fn upload_from_remote_url(
        &self,
        source_url: &str,
        key: &ObjectKey,
        acl: CannedAcl,
    ) -> Option<String> {
        if source_url.starts_with(API_PATH_PREFIX)
            || source_url.starts_with(self.config.public_bucket_endpoint())
        {
            debug!(url = %source_url, "Source already served locally, skipping import");
            return None;
        }

        let fetched = match self.fetcher.fetch(source_url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                error!(
                    url = %source_url,
                    key = %key,
                    acl = %acl,
                    error = %err,
                    "Error uploading to storage from URL"
                );
                return None;
            }
        };

        let size = fetched.body.len();
        if let Some(declared) = fetched.content_length.filter(|len| *len != size as u64) {
            warn!(
                url = %source_url,
                declared,
                received = size,
                "Remote Content-Length differs from received body"
            );
        }
        let request = PutObjectRequest {
            key: key.clone(),
            acl,
            content_type: fetched.content_type,
            content_disposition: Some(ATTACHMENT_DISPOSITION.to_string()),
            body: fetched.body,
        };

        match self.store.put_object(request).await {
            Ok(_) => {
                info!(url = %source_url, key = %key, size, "Imported remote object");
                Some(self.config.public_object_url(key))
            }
            Err(err) => {
                error!(
                    url = %source_url,
                    key = %key,
                    acl = %acl,
                    error = %err,
                    "Error uploading to storage from URL"
                );
                None
            }
        }
    }

    /// Signed download URL valid for [`DEFAULT_SIGNED_URL_EXPIRY_SECS`]
    pub fn get_signed_url(&self, key: &ObjectKey) -> StorageResult<String> {
        self.get_signed_url_with_expiry(key, DEFAULT_SIGNED_URL_EXPIRY_SECS)
    }

    /// Signed GET on the public endpoint forcing an attachment download
    pub fn get_signed_url_with_expiry(
        &self,
        key: &ObjectKey,
        expires_in_secs: u64,
    ) -> StorageResult<String> {
        let signer = self.signer()?;
        let url = object_url(self.config.public_bucket_url(), key);

        signer
            .presign_url(
                "GET",
                &url,
                expires_in_secs,
                &[("response-content-disposition", ATTACHMENT_DISPOSITION)],
                Utc::now(),
            )
            .ok_or_else(|| StorageError::SigningUnavailable {
                reason: format!("public endpoint '{}' has no host", url),
            })
    }

    /// Stream an object's body, or `None` (logged) when it cannot be read
    pub async fn get_object_stream(&self, key: &ObjectKey) -> Option<ObjectByteStream> {
        match self.store.get_object_stream(key).await {
            Ok(stream) => Some(stream),
            Err(err) => {
                error!(key = %key, error = %err, "Error getting object stream");
                None
            }
        }
    }

    /// Read a whole object into memory
    pub async fn get_object_buffer(&self, key: &ObjectKey) -> StorageResult<Bytes> {
        self.store.get_object(key).await
    }

    pub async fn head(&self, key: &ObjectKey) -> StorageResult<ObjectInfo> {
        self.store.head_object(key).await
    }

    pub async fn delete(&self, key: &ObjectKey) -> StorageResult<()> {
        self.store.delete_object(key).await?;
        info!(key = %key, "Deleted object");
        Ok(())
    }
}

//! S3 storage adapter implementation using the object_store crate

pub mod s3_adapter;

pub use s3_adapter::S3ObjectStoreAdapter;

use object_store::{aws::AmazonS3Builder, ObjectStore as ObjectStoreBackend};
use std::sync::Arc;

use crate::{
    adapters::outbound::{
        signing::RequestSigner, storage::apache_object_store_adapter::ApacheObjectStoreAdapter,
    },
    domain::{
        errors::ConfigurationError, models::StorageConfig, value_objects::AddressingStyle,
    },
};

/// Create an object_store S3 client for the resolved configuration.
///
/// In domain style object_store expects the bucket already folded into the
/// endpoint host; in path style it appends the bucket itself.
pub fn create_s3_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStoreBackend>, ConfigurationError> {
    let virtual_hosted = config.addressing_style() == AddressingStyle::Domain;
    let endpoint = if virtual_hosted {
        config.internal_bucket_url()
    } else {
        config.internal_endpoint()
    };

    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(config.bucket().as_str())
        .with_region(config.region())
        .with_endpoint(endpoint.as_str().trim_end_matches('/'))
        .with_virtual_hosted_style_request(virtual_hosted)
        .with_allow_http(endpoint.scheme() == "http");

    if let Some(credentials) = config.credentials() {
        builder = builder
            .with_access_key_id(&credentials.access_key_id)
            .with_secret_access_key(&credentials.secret_access_key);
        if let Some(token) = &credentials.session_token {
            builder = builder.with_token(token);
        }
    }

    let store = builder.build().map_err(|e| ConfigurationError::Backend {
        message: format!("Failed to build S3 store: {}", e),
    })?;

    Ok(Arc::new(store))
}

/// Create the S3 adapter: object_store for most traffic plus a signer for ACL writes
pub fn create_s3_adapter(config: &StorageConfig) -> Result<S3ObjectStoreAdapter, ConfigurationError> {
    let store = create_s3_store(config)?;
    let signer = config
        .credentials()
        .map(|credentials| RequestSigner::new(credentials.clone(), config.region()));
    let http = reqwest::Client::builder()
        .build()
        .map_err(|e| ConfigurationError::Backend {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

    Ok(S3ObjectStoreAdapter::new(
        ApacheObjectStoreAdapter::new(store),
        config.internal_bucket_url().clone(),
        signer,
        http,
    ))
}

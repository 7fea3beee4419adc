use object_store::memory::InMemory;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    adapters::outbound::{
        http::{EgressPolicy, RemoteFetcher},
        storage::{create_s3_adapter, ApacheObjectStoreAdapter},
    },
    domain::{errors::ConfigurationError, models::StorageConfig},
    ports::storage::ObjectStore,
    services::{ObjectStorageClient, StorageConfigResolver, StorageSettings},
};

pub const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
pub const ALLOWED_PRIVATE_IP_ADDRESSES_ENV: &str = "ALLOWED_PRIVATE_IP_ADDRESSES";

/// Storage backend configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local store for tests and development
    InMemory,
    #[default]
    S3,
}

impl FromStr for StorageBackend {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "memory" | "in-memory" => Ok(Self::InMemory),
            other => Err(ConfigurationError::InvalidSetting {
                setting: STORAGE_BACKEND_ENV,
                reason: format!("unknown storage backend '{}'", other),
            }),
        }
    }
}

/// Parse a comma separated list of IP addresses
pub fn parse_ip_list(
    setting: &'static str,
    value: &str,
) -> Result<Vec<IpAddr>, ConfigurationError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<IpAddr>()
                .map_err(|e| ConfigurationError::InvalidSetting {
                    setting,
                    reason: format!("'{}' is not an IP address: {}", item, e),
                })
        })
        .collect()
}

/// Application builder for dependency injection
pub struct AppBuilder {
    settings: StorageSettings,
    config: Option<StorageConfig>,
    backend: StorageBackend,
    egress_policy: EgressPolicy,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            settings: StorageSettings::default(),
            config: None,
            backend: StorageBackend::default(),
            egress_policy: EgressPolicy::default(),
        }
    }

    /// Resolve configuration from raw settings at build time
    pub fn with_settings(mut self, settings: StorageSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use an already resolved configuration, ignoring any settings
    pub fn with_config(mut self, config: StorageConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_backend(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Policy applied to remote imports
    pub fn with_egress_policy(mut self, policy: EgressPolicy) -> Self {
        self.egress_policy = policy;
        self
    }

    /// Build the storage client
    pub fn build(self) -> Result<ObjectStorageClient, ConfigurationError> {
        let config = match self.config {
            Some(config) => config,
            None => StorageConfigResolver::resolve(&self.settings)?,
        };

        let store: Arc<dyn ObjectStore> = match self.backend {
            StorageBackend::InMemory => {
                Arc::new(ApacheObjectStoreAdapter::new(Arc::new(InMemory::new())))
            }
            StorageBackend::S3 => Arc::new(create_s3_adapter(&config)?),
        };

        let fetcher =
            RemoteFetcher::new(self.egress_policy).map_err(|e| ConfigurationError::Backend {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        if config.credentials().is_none() {
            warn!("No static credentials configured; signed URLs and presigned uploads are unavailable");
        }
        info!(backend = ?self.backend, bucket = %config.bucket(), "Storage client ready");

        Ok(ObjectStorageClient::new(config, store, fetcher))
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience functions for common configurations
///
/// Create an in-memory client for testing and development
pub fn create_in_memory_client(
    config: StorageConfig,
) -> Result<ObjectStorageClient, ConfigurationError> {
    AppBuilder::new()
        .with_config(config)
        .with_backend(StorageBackend::InMemory)
        .build()
}

/// Create a client from environment variables
pub fn create_client_from_env() -> Result<ObjectStorageClient, ConfigurationError> {
    let backend = match std::env::var(STORAGE_BACKEND_ENV) {
        Ok(value) if !value.trim().is_empty() => value.parse()?,
        _ => StorageBackend::default(),
    };

    let egress_policy = match std::env::var(ALLOWED_PRIVATE_IP_ADDRESSES_ENV) {
        Ok(value) => EgressPolicy::new().allow(parse_ip_list(
            ALLOWED_PRIVATE_IP_ADDRESSES_ENV,
            &value,
        )?),
        Err(_) => EgressPolicy::new(),
    };

    AppBuilder::new()
        .with_settings(StorageSettings::from_env())
        .with_backend(backend)
        .with_egress_policy(egress_policy)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn settings() -> StorageSettings {
        StorageSettings {
            bucket_name: Some("outline".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("s3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(" Memory ".parse::<StorageBackend>().unwrap(), StorageBackend::InMemory);
        assert!("gcs".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_parse_ip_list() {
        let ips = parse_ip_list(ALLOWED_PRIVATE_IP_ADDRESSES_ENV, "127.0.0.1, ::1,").unwrap();
        assert_eq!(ips.len(), 2);

        assert!(parse_ip_list(ALLOWED_PRIVATE_IP_ADDRESSES_ENV, "10.0.0.300").is_err());
    }

    #[test]
    fn test_builder_requires_bucket() {
        let result = AppBuilder::new()
            .with_backend(StorageBackend::InMemory)
            .build();

        assert!(matches!(result, Err(ConfigurationError::MissingBucketName)));
    }

    #[tokio::test]
    async fn test_in_memory_client_round_trip() {
        let client = AppBuilder::new()
            .with_settings(settings())
            .with_backend(StorageBackend::InMemory)
            .build()
            .unwrap();

        let key = client.issue_key("uploads", "user-1", "notes.txt").unwrap();
        client
            .upload(crate::domain::models::UploadDescriptor::new(
                key.clone(),
                Default::default(),
                "text/plain",
                Bytes::from_static(b"notes"),
            ))
            .await
            .unwrap();

        assert_eq!(
            client.get_object_buffer(&key).await.unwrap(),
            Bytes::from_static(b"notes")
        );
    }

    #[test]
    fn test_s3_backend_builds_without_network() {
        let client = AppBuilder::new().with_settings(settings()).build();
        assert!(client.is_ok());
    }
}

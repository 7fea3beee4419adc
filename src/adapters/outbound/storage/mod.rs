// Infrastructure error mapping
pub mod error;

// Storage implementations
pub mod apache_object_store_adapter;

// Provider-specific implementations
pub mod s3;

// Re-export key types
pub use apache_object_store_adapter::ApacheObjectStoreAdapter;
pub use s3::{create_s3_adapter, create_s3_store, S3ObjectStoreAdapter};

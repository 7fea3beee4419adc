pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - configuration, descriptors and value objects
pub use domain::{
    AddressingStyle,
    AttachmentRecord,
    BucketName,
    CannedAcl,
    // Errors
    ConfigurationError,
    Credentials,
    DomainValidationError,
    ObjectInfo,
    // Value objects
    ObjectKey,
    PostCondition,
    PresignedPost,
    // Models
    StorageConfig,
    StorageError,
    UploadDescriptor,
};

// Port types - interfaces for external systems
pub use ports::{AttachmentRepository, ObjectByteStream, ObjectStore};

// Services - configuration resolution and the storage client
pub use services::{
    parse_attachment_ids, AttachmentLinkRewriter, ObjectStorageClient, StorageConfigResolver,
    StorageSettings,
};

// Application factory and configuration
pub use app::{create_client_from_env, create_in_memory_client, AppBuilder, StorageBackend};

// Adapter types - infrastructure implementations
pub use adapters::outbound::{
    http::{EgressPolicy, FetchError, RemoteFetcher},
    persistence::InMemoryAttachmentRepository,
    storage::{ApacheObjectStoreAdapter, S3ObjectStoreAdapter},
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_client_from_env, create_in_memory_client, AppBuilder, CannedAcl, EgressPolicy,
        ObjectKey, ObjectStorageClient, StorageBackend, StorageConfig, StorageConfigResolver,
        StorageError, StorageSettings, UploadDescriptor,
    };
}

pub mod attachment_links;
pub mod config_resolver;
pub mod object_storage_client;

pub use attachment_links::{parse_attachment_ids, AttachmentLinkRewriter};
pub use config_resolver::{StorageConfigResolver, StorageSettings};
pub use object_storage_client::{ObjectStorageClient, DEFAULT_SIGNED_URL_EXPIRY_SECS};

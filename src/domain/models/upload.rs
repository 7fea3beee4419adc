use bytes::Bytes;

use crate::domain::value_objects::{CannedAcl, ObjectKey};

/// Content disposition forced on everything written or signed by this crate
pub const ATTACHMENT_DISPOSITION: &str = "attachment";

/// A single direct upload, built per call and never persisted
#[derive(Debug, Clone)]
pub struct UploadDescriptor {
    pub key: ObjectKey,
    pub acl: CannedAcl,
    pub content_type: String,
    pub content_length: u64,
    pub body: Bytes,
}

impl UploadDescriptor {
    /// Build a descriptor whose declared length is taken from the body
    pub fn new(
        key: ObjectKey,
        acl: CannedAcl,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        let body = body.into();
        Self {
            key,
            acl,
            content_type: content_type.into(),
            content_length: body.len() as u64,
            body,
        }
    }
}

/// Write request handed to the object store port
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub key: ObjectKey,
    pub acl: CannedAcl,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Bytes,
}

/// Metadata about a stored object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub key: ObjectKey,
    pub size: u64,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

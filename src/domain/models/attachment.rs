use uuid::Uuid;

use crate::domain::value_objects::ObjectKey;

/// Path served by the application that redirects to an attachment
pub const ATTACHMENT_REDIRECT_PATH: &str = "/api/attachments.redirect";

/// Marker appended after a signed URL so rewritten links stay recognizable
pub const ATTACHMENT_REDIRECT_MARKER: &str = "# attachments.redirect";

/// A stored attachment referenced from document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub id: Uuid,
    pub key: ObjectKey,
}

impl AttachmentRecord {
    pub fn new(id: Uuid, key: ObjectKey) -> Self {
        Self { id, key }
    }

    /// Redirect link as it appears in document text
    pub fn redirect_url(&self) -> String {
        format!("{}?id={}", ATTACHMENT_REDIRECT_PATH, self.id)
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use futures::future::try_join_all;
use regex::{Captures, Regex};
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::{errors::StorageResult, models::ATTACHMENT_REDIRECT_MARKER},
    ports::repositories::AttachmentRepository,
    services::ObjectStorageClient,
};

/// Lifetime of signed URLs embedded into rewritten text
pub const ATTACHMENT_SIGNED_URL_EXPIRY_SECS: u64 = 3600;

fn redirect_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"/api/attachments\.redirect\?id=([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})",
        )
        .expect("attachment redirect pattern is valid")
    })
}

/// Attachment ids referenced by redirect links in `text`, in order of first appearance
pub fn parse_attachment_ids(text: &str) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    redirect_pattern()
        .captures_iter(text)
        .filter_map(|captures| Uuid::parse_str(&captures[1]).ok())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Replaces attachment redirect links in document text with signed URLs
#[derive(Clone)]
pub struct AttachmentLinkRewriter {
    repository: Arc<dyn AttachmentRepository>,
    client: ObjectStorageClient,
}

impl AttachmentLinkRewriter {
    pub fn new(repository: Arc<dyn AttachmentRepository>, client: ObjectStorageClient) -> Self {
        Self { repository, client }
    }

    /// Rewrite every known redirect link into `<signed url># attachments.redirect`.
    ///
    /// Links to unknown attachments are left as they are.
    pub async fn rewrite(&self, text: &str) -> StorageResult<String> {
        let ids = parse_attachment_ids(text);
        if ids.is_empty() {
            return Ok(text.to_string());
        }

        let lookups = ids.iter().map(|id| self.repository.find_attachment(id));
        let records = try_join_all(lookups).await?;

        let mut signed_links = HashMap::new();
        for record in records.into_iter().flatten() {
            let signed = self
                .client
                .get_signed_url_with_expiry(&record.key, ATTACHMENT_SIGNED_URL_EXPIRY_SECS)?;
            signed_links.insert(record.id, format!("{}{}", signed, ATTACHMENT_REDIRECT_MARKER));
        }

        let rewritten = redirect_pattern().replace_all(text, |captures: &Captures| {
            Uuid::parse_str(&captures[1])
                .ok()
                .and_then(|id| signed_links.get(&id))
                .cloned()
                .unwrap_or_else(|| captures[0].to_string())
        });

        debug!(links = ids.len(), "Rewrote attachment links");
        Ok(rewritten.into_owned())
    }
}

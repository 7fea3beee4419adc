use std::sync::Arc;

use object_storage_client::{
    create_in_memory_client, AttachmentLinkRewriter, AttachmentRecord, InMemoryAttachmentRepository,
    ObjectKey, StorageConfigResolver, StorageSettings,
};
use uuid::Uuid;

fn settings() -> StorageSettings {
    StorageSettings {
        upload_bucket_name: Some("outline".into()),
        upload_bucket_url: Some("http://minio.local:9000".into()),
        access_key_id: Some("minio".into()),
        secret_access_key: Some("minio-secret".into()),
        ..Default::default()
    }
}

async fn rewriter_with(records: &[AttachmentRecord]) -> AttachmentLinkRewriter {
    let config = StorageConfigResolver::resolve(&settings()).unwrap();
    let client = create_in_memory_client(config).unwrap();

    let repository = InMemoryAttachmentRepository::new();
    for record in records {
        repository.insert(record.clone()).await;
    }

    AttachmentLinkRewriter::new(Arc::new(repository), client)
}

#[tokio::test]
async fn test_known_attachments_are_signed() {
    let record = AttachmentRecord::new(
        Uuid::new_v4(),
        ObjectKey::new("uploads/user-1/abc/diagram.png").unwrap(),
    );
    let rewriter = rewriter_with(&[record.clone()]).await;

    let text = format!(
        "Intro\n\n![diagram]({url})\n\n[download]({url})",
        url = record.redirect_url()
    );
    let rewritten = rewriter.rewrite(&text).await.unwrap();

    assert!(!rewritten.contains("/api/attachments.redirect"));
    assert_eq!(
        rewritten
            .matches("http://minio.local:9000/outline/uploads/user-1/abc/diagram.png?")
            .count(),
        2
    );
    assert_eq!(rewritten.matches("# attachments.redirect").count(), 2);
    assert!(rewritten.contains("X-Amz-Expires=3600"));
    assert!(rewritten.starts_with("Intro\n\n![diagram](http://"));
}

#[tokio::test]
async fn test_unknown_attachments_are_left_alone() {
    let known = AttachmentRecord::new(Uuid::new_v4(), ObjectKey::new("uploads/known.png").unwrap());
    let unknown = AttachmentRecord::new(Uuid::new_v4(), ObjectKey::new("uploads/gone.png").unwrap());
    let rewriter = rewriter_with(&[known.clone()]).await;

    let text = format!("{} {}", known.redirect_url(), unknown.redirect_url());
    let rewritten = rewriter.rewrite(&text).await.unwrap();

    assert!(!rewritten.contains(&known.redirect_url()));
    assert!(rewritten.ends_with(&unknown.redirect_url()));
}

#[tokio::test]
async fn test_text_without_links_is_unchanged() {
    let rewriter = rewriter_with(&[]).await;
    let text = "No attachments here, just /api/documents.info";

    assert_eq!(rewriter.rewrite(text).await.unwrap(), text);
}

#[tokio::test]
async fn test_uppercase_attachment_ids_are_signed() {
    let record = AttachmentRecord::new(Uuid::new_v4(), ObjectKey::new("uploads/shout.png").unwrap());
    let rewriter = rewriter_with(&[record.clone()]).await;

    let text = format!(
        "![shout](/api/attachments.redirect?id={})",
        record.id.to_string().to_uppercase()
    );
    let rewritten = rewriter.rewrite(&text).await.unwrap();

    assert!(!rewritten.contains("/api/attachments.redirect"));
    assert!(rewritten.contains("http://minio.local:9000/outline/uploads/shout.png?"));
    assert!(rewritten.ends_with("# attachments.redirect)"));
}

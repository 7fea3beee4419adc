mod in_memory_attachment_repository;

pub use in_memory_attachment_repository::InMemoryAttachmentRepository;

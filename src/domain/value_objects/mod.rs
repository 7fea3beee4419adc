mod addressing_style;
mod bucket_name;
mod canned_acl;
mod object_key;

pub use addressing_style::AddressingStyle;
pub use bucket_name::BucketName;
pub use canned_acl::CannedAcl;
pub use object_key::ObjectKey;

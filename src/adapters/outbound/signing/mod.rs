//! Request signing for URLs handed to clients and for ACL-carrying writes.

mod sigv4;

pub use sigv4::{uri_encode, RequestSigner, ALGORITHM, MAX_PRESIGN_EXPIRY_SECS};

use url::Url;

use crate::domain::value_objects::ObjectKey;

/// URL of `key` under a bucket-qualified endpoint, with a SigV4-encoded path
pub fn object_url(bucket_url: &Url, key: &ObjectKey) -> Url {
    let mut url = bucket_url.clone();
    let path = format!(
        "{}/{}",
        bucket_url.path().trim_end_matches('/'),
        uri_encode(key.as_str(), false)
    );
    url.set_path(&path);
    url.set_query(None);
    url
}

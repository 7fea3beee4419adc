use url::Url;

use crate::domain::value_objects::{AddressingStyle, BucketName, ObjectKey};

/// Static credentials used for request signing and the S3 client
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Canonical storage configuration, resolved once at start-up.
///
/// Built by [`StorageConfigResolver`](crate::services::StorageConfigResolver);
/// there is no public way to mutate it afterwards.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub(crate) bucket: BucketName,
    pub(crate) region: String,
    pub(crate) service: String,
    pub(crate) provider: String,
    pub(crate) internal_endpoint: Url,
    pub(crate) public_endpoint: Url,
    pub(crate) addressing_style: AddressingStyle,
    pub(crate) force_path_style: bool,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) internal_bucket_url: Url,
    pub(crate) public_bucket_url: Url,
}

impl StorageConfig {
    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Endpoint used for server-initiated operations (put, get, delete)
    pub fn internal_endpoint(&self) -> &Url {
        &self.internal_endpoint
    }

    /// Endpoint used for URLs handed to end users
    pub fn public_endpoint(&self) -> &Url {
        &self.public_endpoint
    }

    pub fn addressing_style(&self) -> AddressingStyle {
        self.addressing_style
    }

    pub fn force_path_style(&self) -> bool {
        self.force_path_style
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Internal endpoint with the bucket folded in according to the addressing style
    pub fn internal_bucket_url(&self) -> &Url {
        &self.internal_bucket_url
    }

    /// Public endpoint with the bucket folded in according to the addressing style
    pub fn public_bucket_url(&self) -> &Url {
        &self.public_bucket_url
    }

    /// Public bucket URL as a string without a trailing slash
    pub fn public_bucket_endpoint(&self) -> &str {
        self.public_bucket_url.as_str().trim_end_matches('/')
    }

    /// Public URL of a stored object: `<public bucket endpoint>/<key>`
    pub fn public_object_url(&self, key: &ObjectKey) -> String {
        format!("{}/{}", self.public_bucket_endpoint(), key)
    }
}

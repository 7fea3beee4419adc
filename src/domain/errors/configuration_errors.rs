use crate::domain::errors::ValidationError;

/// Errors raised while resolving storage configuration at start-up.
///
/// These are fatal: a process that cannot resolve its storage configuration
/// must not start serving requests.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("No bucket configured: set AWS_S3_BUCKET_NAME (or the legacy AWS_S3_UPLOAD_BUCKET_NAME)")]
    MissingBucketName,

    #[error("Invalid bucket name '{name}': {reason}")]
    InvalidBucketName {
        name: String,
        reason: ValidationError,
    },

    #[error("Invalid URL in {setting}: '{value}': {source}")]
    InvalidUrl {
        setting: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported scheme '{scheme}' in {setting}: only http and https are allowed")]
    UnsupportedScheme {
        setting: &'static str,
        scheme: String,
    },

    #[error("URL in {setting} has no host: '{value}'")]
    MissingHost { setting: &'static str, value: String },

    #[error("Cannot qualify endpoint '{endpoint}' with bucket '{bucket}'")]
    InvalidBucketHost { endpoint: String, bucket: String },

    #[error("Invalid value for {setting}: {reason}")]
    InvalidSetting {
        setting: &'static str,
        reason: String,
    },

    #[error("Storage backend initialization failed: {message}")]
    Backend { message: String },
}

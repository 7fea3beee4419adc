use tracing::info;
use url::Url;

use crate::domain::{
    errors::ConfigurationError,
    models::{Credentials, StorageConfig},
    value_objects::{AddressingStyle, BucketName},
};

/// Environment keys recognized by [`StorageSettings::from_env`]
pub mod keys {
    pub const BUCKET_NAME: &str = "AWS_S3_BUCKET_NAME";
    pub const UPLOAD_BUCKET_NAME: &str = "AWS_S3_UPLOAD_BUCKET_NAME";
    pub const UPLOAD_BUCKET_URL: &str = "AWS_S3_UPLOAD_BUCKET_URL";
    pub const ACCELERATE_URL: &str = "AWS_S3_ACCELERATE_URL";
    pub const REGION: &str = "AWS_REGION";
    pub const SERVICE: &str = "AWS_SERVICE";
    pub const PROVIDER: &str = "AWS_S3_PROVIDER";
    pub const ENDPOINT: &str = "AWS_S3_ENDPOINT";
    pub const PUBLIC_ENDPOINT: &str = "AWS_S3_PUBLIC_ENDPOINT";
    pub const ENDPOINT_STYLE: &str = "AWS_S3_ENDPOINT_STYLE";
    pub const FORCE_PATH_STYLE: &str = "AWS_S3_FORCE_PATH_STYLE";
    pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    pub const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
}

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_SERVICE: &str = "s3";
pub const DEFAULT_PROVIDER: &str = "amazonaws.com";

/// Raw storage settings as found in the environment or on the command line.
/// Empty values count as unset.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StorageSettings {
    /// Bucket that stores uploads
    #[arg(long = "bucket", env = "AWS_S3_BUCKET_NAME")]
    pub bucket_name: Option<String>,

    /// Legacy bucket name, also used to undo bucket-prefixed legacy hosts
    #[arg(long, env = "AWS_S3_UPLOAD_BUCKET_NAME")]
    pub upload_bucket_name: Option<String>,

    /// Legacy upload bucket URL
    #[arg(long, env = "AWS_S3_UPLOAD_BUCKET_URL")]
    pub upload_bucket_url: Option<String>,

    /// Transfer-acceleration URL used for public links
    #[arg(long, env = "AWS_S3_ACCELERATE_URL")]
    pub accelerate_url: Option<String>,

    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Service label of the synthesized endpoint host
    #[arg(long, env = "AWS_SERVICE")]
    pub service: Option<String>,

    /// Domain suffix of the synthesized endpoint host
    #[arg(long, env = "AWS_S3_PROVIDER")]
    pub provider: Option<String>,

    /// Endpoint for server-side operations
    #[arg(long, env = "AWS_S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Endpoint for URLs handed to clients
    #[arg(long, env = "AWS_S3_PUBLIC_ENDPOINT")]
    pub public_endpoint: Option<String>,

    /// `domain` or `path`
    #[arg(long, env = "AWS_S3_ENDPOINT_STYLE")]
    pub endpoint_style: Option<String>,

    #[arg(long, env = "AWS_S3_FORCE_PATH_STYLE")]
    pub force_path_style: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,
}

impl StorageSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bucket_name: lookup(keys::BUCKET_NAME),
            upload_bucket_name: lookup(keys::UPLOAD_BUCKET_NAME),
            upload_bucket_url: lookup(keys::UPLOAD_BUCKET_URL),
            accelerate_url: lookup(keys::ACCELERATE_URL),
            region: lookup(keys::REGION),
            service: lookup(keys::SERVICE),
            provider: lookup(keys::PROVIDER),
            endpoint: lookup(keys::ENDPOINT),
            public_endpoint: lookup(keys::PUBLIC_ENDPOINT),
            endpoint_style: lookup(keys::ENDPOINT_STYLE),
            force_path_style: lookup(keys::FORCE_PATH_STYLE),
            access_key_id: lookup(keys::ACCESS_KEY_ID),
            secret_access_key: lookup(keys::SECRET_ACCESS_KEY),
            session_token: lookup(keys::SESSION_TOKEN),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_flag(setting: &'static str, value: Option<&str>) -> Result<bool, ConfigurationError> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigurationError::InvalidSetting {
            setting,
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}

/// Parse an endpoint URL, accepting only http(s) URLs with a host
pub fn parse_endpoint(setting: &'static str, value: &str) -> Result<Url, ConfigurationError> {
    let url = Url::parse(value).map_err(|source| ConfigurationError::InvalidUrl {
        setting,
        value: value.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigurationError::UnsupportedScheme {
                setting,
                scheme: other.to_string(),
            })
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigurationError::MissingHost {
            setting,
            value: value.to_string(),
        });
    }

    Ok(url)
}

/// Remove a leading `<bucket>.` label from the URL host.
///
/// Older deployments configured URLs with the bucket already baked into the
/// host; the bucket is added back later according to the addressing style.
/// Applying this twice is the same as applying it once.
pub fn strip_bucket_prefix(url: &Url, bucket: &str) -> Url {
    let prefix = format!("{}.", bucket);
    match url.host_str() {
        Some(host) if host.len() > prefix.len() && host.starts_with(&prefix) => {
            let mut rewritten = url.clone();
            match rewritten.set_host(Some(&host[prefix.len()..])) {
                Ok(()) => rewritten,
                Err(_) => url.clone(),
            }
        }
        _ => url.clone(),
    }
}

/// Infer the addressing style from an operator-supplied endpoint host.
///
/// This is a plain substring test: a host that mentions the bucket anywhere
/// is treated as virtual-hosted.
pub fn infer_addressing_style(bucket: &str, host: Option<&str>) -> AddressingStyle {
    match host {
        Some(host) if !host.contains(bucket) => AddressingStyle::Path,
        _ => AddressingStyle::Domain,
    }
}

/// Fold the bucket into an endpoint: as a host label (domain style, never
/// duplicated) or as a trailing path segment (path style).
pub fn bucket_qualified_url(
    endpoint: &Url,
    bucket: &BucketName,
    style: AddressingStyle,
) -> Result<Url, ConfigurationError> {
    let mut url = endpoint.clone();
    url.set_query(None);
    url.set_fragment(None);

    match style {
        AddressingStyle::Domain => {
            let host = endpoint
                .host_str()
                .ok_or_else(|| ConfigurationError::MissingHost {
                    setting: keys::ENDPOINT,
                    value: endpoint.to_string(),
                })?;
            let prefix = bucket.host_prefix();
            if !host.starts_with(&prefix) {
                url.set_host(Some(&format!("{}{}", prefix, host)))
                    .map_err(|_| ConfigurationError::InvalidBucketHost {
                        endpoint: endpoint.to_string(),
                        bucket: bucket.to_string(),
                    })?;
            }
        }
        AddressingStyle::Path => {
            let path = format!("{}/{}", endpoint.path().trim_end_matches('/'), bucket);
            url.set_path(&path);
        }
    }

    Ok(url)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndpointSource {
    Custom,
    LegacyUpload,
    Synthesized,
}

/// Derives the canonical [`StorageConfig`] from raw settings
pub struct StorageConfigResolver;

impl StorageConfigResolver {
    pub fn resolve(settings: &StorageSettings) -> Result<StorageConfig, ConfigurationError> {
        let force_path_style =
            parse_flag(keys::FORCE_PATH_STYLE, non_empty(&settings.force_path_style))?;

        let legacy_bucket = non_empty(&settings.upload_bucket_name);
        let bucket_name = non_empty(&settings.bucket_name)
            .or(legacy_bucket)
            .ok_or(ConfigurationError::MissingBucketName)?;
        let bucket = BucketName::new(bucket_name).map_err(|reason| {
            ConfigurationError::InvalidBucketName {
                name: bucket_name.to_string(),
                reason,
            }
        })?;

        let rewrite_legacy = |url: &Url| match legacy_bucket {
            Some(legacy) if !force_path_style => strip_bucket_prefix(url, legacy),
            _ => url.clone(),
        };

        let region = non_empty(&settings.region)
            .unwrap_or(DEFAULT_REGION)
            .to_string();
        let service = non_empty(&settings.service)
            .unwrap_or(DEFAULT_SERVICE)
            .to_string();
        let provider = non_empty(&settings.provider)
            .unwrap_or(DEFAULT_PROVIDER)
            .to_string();

        let legacy_upload_url = non_empty(&settings.upload_bucket_url)
            .map(|value| parse_endpoint(keys::UPLOAD_BUCKET_URL, value))
            .transpose()?;
        let accelerate_url = non_empty(&settings.accelerate_url)
            .map(|value| parse_endpoint(keys::ACCELERATE_URL, value))
            .transpose()?
            .map(|url| rewrite_legacy(&url));

        let (internal_endpoint, source, inference_host) =
            if let Some(custom) = non_empty(&settings.endpoint) {
                let url = parse_endpoint(keys::ENDPOINT, custom)?;
                let host = url.host_str().map(str::to_owned);
                (url, EndpointSource::Custom, host)
            } else if let Some(raw) = &legacy_upload_url {
                // containment is judged on the URL as configured, before the rewrite
                let host = raw.host_str().map(str::to_owned);
                (rewrite_legacy(raw), EndpointSource::LegacyUpload, host)
            } else {
                let synthesized = format!("https://{}.{}.{}", service, region, provider);
                let url = parse_endpoint(keys::ENDPOINT, &synthesized)?;
                (url, EndpointSource::Synthesized, None)
            };

        let addressing_style = match non_empty(&settings.endpoint_style) {
            Some(style) => style.parse::<AddressingStyle>().map_err(|e| {
                ConfigurationError::InvalidSetting {
                    setting: keys::ENDPOINT_STYLE,
                    reason: e.to_string(),
                }
            })?,
            None if force_path_style => AddressingStyle::Path,
            None => infer_addressing_style(bucket.as_str(), inference_host.as_deref()),
        };

        let public_endpoint = match non_empty(&settings.public_endpoint) {
            Some(value) => parse_endpoint(keys::PUBLIC_ENDPOINT, value)?,
            None => accelerate_url.unwrap_or_else(|| internal_endpoint.clone()),
        };

        let credentials = match (
            non_empty(&settings.access_key_id),
            non_empty(&settings.secret_access_key),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(Credentials {
                access_key_id: access_key_id.to_string(),
                secret_access_key: secret_access_key.to_string(),
                session_token: non_empty(&settings.session_token).map(str::to_owned),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigurationError::InvalidSetting {
                    setting: keys::ACCESS_KEY_ID,
                    reason: format!(
                        "{} and {} must be set together",
                        keys::ACCESS_KEY_ID,
                        keys::SECRET_ACCESS_KEY
                    ),
                })
            }
        };

        let internal_bucket_url =
            bucket_qualified_url(&internal_endpoint, &bucket, addressing_style)?;
        let public_bucket_url = bucket_qualified_url(&public_endpoint, &bucket, addressing_style)?;

        info!(
            bucket = %bucket,
            region = %region,
            addressing_style = %addressing_style,
            endpoint_source = ?source,
            internal_endpoint = %internal_endpoint,
            public_bucket_url = %public_bucket_url,
            "Resolved storage configuration"
        );

        Ok(StorageConfig {
            bucket,
            region,
            service,
            provider,
            internal_endpoint,
            public_endpoint,
            addressing_style,
            force_path_style,
            credentials,
            internal_bucket_url,
            public_bucket_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> StorageSettings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StorageSettings::from_lookup(|key| env.get(key).cloned())
    }

    fn resolve(pairs: &[(&str, &str)]) -> StorageConfig {
        StorageConfigResolver::resolve(&settings(pairs)).unwrap()
    }

    #[test]
    fn test_synthesized_endpoint_defaults_to_domain_style() {
        let config = resolve(&[(keys::BUCKET_NAME, "outline"), (keys::REGION, "eu-west-1")]);

        assert_eq!(
            config.internal_endpoint().as_str(),
            "https://s3.eu-west-1.amazonaws.com/"
        );
        assert_eq!(config.addressing_style(), AddressingStyle::Domain);
        assert_eq!(config.public_endpoint(), config.internal_endpoint());
        assert_eq!(
            config.public_bucket_endpoint(),
            "https://outline.s3.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_bucket_with_consecutive_hyphens_resolves() {
        let config = resolve(&[(keys::BUCKET_NAME, "team--uploads")]);

        assert_eq!(config.bucket().as_str(), "team--uploads");
        assert_eq!(
            config.public_bucket_endpoint(),
            "https://team--uploads.s3.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn test_region_service_and_provider_defaults() {
        let config = resolve(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::SERVICE, "storage"),
            (keys::PROVIDER, "example.net"),
        ]);

        assert_eq!(config.region(), DEFAULT_REGION);
        assert_eq!(config.service(), "storage");
        assert_eq!(config.provider(), "example.net");
        assert_eq!(
            config.internal_endpoint().as_str(),
            "https://storage.us-east-1.example.net/"
        );
    }

    #[test]
    fn test_legacy_bucket_prefixed_host_is_rewritten() {
        let config = resolve(&[
            (keys::UPLOAD_BUCKET_NAME, "outline"),
            (keys::UPLOAD_BUCKET_URL, "https://outline.s3.amazonaws.com"),
        ]);

        assert_eq!(config.bucket().as_str(), "outline");
        assert_eq!(config.internal_endpoint().host_str(), Some("s3.amazonaws.com"));
        assert_eq!(config.addressing_style(), AddressingStyle::Domain);
        assert_eq!(config.public_bucket_endpoint(), "https://outline.s3.amazonaws.com");
    }

    #[test]
    fn test_strip_bucket_prefix_is_idempotent() {
        for raw in [
            "https://outline.s3.amazonaws.com/",
            "http://outline.minio.local:9000/",
            "https://s3.amazonaws.com/",
            "https://outline/",
        ] {
            let url = Url::parse(raw).unwrap();
            let once = strip_bucket_prefix(&url, "outline");
            let twice = strip_bucket_prefix(&once, "outline");
            assert_eq!(once, twice, "rewrite of {} is not idempotent", raw);
        }

        let url = Url::parse("http://outline.minio.local:9000/").unwrap();
        assert_eq!(
            strip_bucket_prefix(&url, "outline").as_str(),
            "http://minio.local:9000/"
        );
    }

    #[test]
    fn test_legacy_path_style_url_without_bucket_in_host() {
        let config = resolve(&[
            (keys::UPLOAD_BUCKET_NAME, "outline"),
            (keys::UPLOAD_BUCKET_URL, "http://s3:4569"),
        ]);

        assert_eq!(config.addressing_style(), AddressingStyle::Path);
        assert_eq!(config.public_bucket_endpoint(), "http://s3:4569/outline");
        assert_eq!(config.internal_bucket_url().path(), "/outline");
    }

    #[test]
    fn test_force_path_style_skips_rewrite() {
        let config = resolve(&[
            (keys::UPLOAD_BUCKET_NAME, "outline"),
            (keys::UPLOAD_BUCKET_URL, "https://outline.s3.amazonaws.com"),
            (keys::FORCE_PATH_STYLE, "true"),
        ]);

        assert!(config.force_path_style());
        assert_eq!(config.addressing_style(), AddressingStyle::Path);
        assert_eq!(
            config.public_bucket_endpoint(),
            "https://outline.s3.amazonaws.com/outline"
        );
    }

    #[test]
    fn test_explicit_style_wins() {
        let config = resolve(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::ENDPOINT, "http://minio:9000"),
            (keys::ENDPOINT_STYLE, "domain"),
            (keys::FORCE_PATH_STYLE, "true"),
        ]);

        assert_eq!(config.addressing_style(), AddressingStyle::Domain);
        assert_eq!(config.public_bucket_endpoint(), "http://outline.minio:9000");
    }

    #[test]
    fn test_custom_endpoint_containment_is_substring_match() {
        // "outline" appears inside an unrelated host label and still counts
        let config = resolve(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::ENDPOINT, "https://storage.outline-cdn.example.com"),
        ]);
        assert_eq!(config.addressing_style(), AddressingStyle::Domain);
        assert_eq!(
            config.public_bucket_endpoint(),
            "https://outline.storage.outline-cdn.example.com"
        );

        let config = resolve(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::ENDPOINT, "https://storage.example.com"),
        ]);
        assert_eq!(config.addressing_style(), AddressingStyle::Path);
        assert_eq!(
            config.public_bucket_endpoint(),
            "https://storage.example.com/outline"
        );
    }

    #[test]
    fn test_domain_style_never_duplicates_bucket_prefix() {
        let config = resolve(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::ENDPOINT, "https://outline.storage.example.com"),
        ]);

        assert_eq!(config.addressing_style(), AddressingStyle::Domain);
        assert_eq!(
            config.public_bucket_endpoint(),
            "https://outline.storage.example.com"
        );
    }

    #[test]
    fn test_bucket_qualified_url_shapes() {
        let bucket = BucketName::new("docs").unwrap();
        let endpoint = Url::parse("https://files.example.com/base/").unwrap();

        let domain = bucket_qualified_url(&endpoint, &bucket, AddressingStyle::Domain).unwrap();
        assert_eq!(domain.host_str(), Some("docs.files.example.com"));
        assert_eq!(domain.path(), "/base/");

        let path = bucket_qualified_url(&endpoint, &bucket, AddressingStyle::Path).unwrap();
        assert_eq!(path.host_str(), Some("files.example.com"));
        assert_eq!(path.path(), "/base/docs");
    }

    #[test]
    fn test_public_endpoint_precedence() {
        let config = resolve(&[
            (keys::UPLOAD_BUCKET_NAME, "outline"),
            (keys::ACCELERATE_URL, "https://outline.s3-accelerate.amazonaws.com"),
        ]);
        assert_eq!(
            config.public_endpoint().host_str(),
            Some("s3-accelerate.amazonaws.com")
        );
        assert_eq!(
            config.public_bucket_endpoint(),
            "https://outline.s3-accelerate.amazonaws.com"
        );

        let config = resolve(&[
            (keys::UPLOAD_BUCKET_NAME, "outline"),
            (keys::ACCELERATE_URL, "https://outline.s3-accelerate.amazonaws.com"),
            (keys::PUBLIC_ENDPOINT, "https://cdn.example.com"),
        ]);
        assert_eq!(
            config.public_bucket_endpoint(),
            "https://outline.cdn.example.com"
        );
    }

    #[test]
    fn test_configuration_errors() {
        let err = StorageConfigResolver::resolve(&settings(&[])).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingBucketName));

        let err = StorageConfigResolver::resolve(&settings(&[(keys::BUCKET_NAME, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingBucketName));

        let err = StorageConfigResolver::resolve(&settings(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::ENDPOINT, "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidUrl { .. }));

        let err = StorageConfigResolver::resolve(&settings(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::PUBLIC_ENDPOINT, "ftp://files.example.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnsupportedScheme { .. }));

        let err = StorageConfigResolver::resolve(&settings(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::ENDPOINT_STYLE, "sideways"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSetting { .. }));

        let err = StorageConfigResolver::resolve(&settings(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::ACCESS_KEY_ID, "AKIA"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSetting { .. }));

        let err = StorageConfigResolver::resolve(&settings(&[(keys::BUCKET_NAME, "Not_Valid")]))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidBucketName { .. }));
    }

    #[test]
    fn test_credentials_are_redacted_in_debug() {
        let config = resolve(&[
            (keys::BUCKET_NAME, "outline"),
            (keys::ACCESS_KEY_ID, "AKIAEXAMPLE"),
            (keys::SECRET_ACCESS_KEY, "super-secret"),
        ]);

        let rendered = format!("{:?}", config);
        assert!(rendered.contains("AKIAEXAMPLE"));
        assert!(!rendered.contains("super-secret"));
    }
}

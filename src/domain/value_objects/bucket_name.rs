use crate::domain::errors::ValidationError;

/// A validated bucket name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(String);

impl BucketName {
    /// Create a new BucketName with S3-compatible validation rules
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.len() < 3 {
            return Err(ValidationError::BucketNameTooShort {
                actual: value.len(),
                min: 3,
            });
        }

        if value.len() > 63 {
            return Err(ValidationError::BucketNameTooLong {
                actual: value.len(),
                max: 63,
            });
        }

        // Must start and end with lowercase letter or number
        if !value
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::BucketNameInvalidStart);
        }

        if !value
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::BucketNameInvalidEnd);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-' && *c != '.')
        {
            return Err(ValidationError::BucketNameInvalidCharacter(c));
        }

        if value.contains("..") {
            return Err(ValidationError::BucketNameAdjacentDots);
        }

        if Self::looks_like_ip_address(&value) {
            return Err(ValidationError::BucketNameLooksLikeIpAddress);
        }

        Ok(Self(value))
    }

    /// Get the bucket name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host label prefix used for domain-style addressing (`<bucket>.`)
    pub fn host_prefix(&self) -> String {
        format!("{}.", self.0)
    }

    /// Check if a string looks like an IP address
    fn looks_like_ip_address(s: &str) -> bool {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 4 {
            return false;
        }

        parts.iter().all(|part| part.parse::<u8>().is_ok())
    }
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bucket_names() {
        assert!(BucketName::new("outline").is_ok());
        assert!(BucketName::new("my-bucket").is_ok());
        assert!(BucketName::new("123bucket").is_ok());
        assert!(BucketName::new("assets.example.com").is_ok());
        assert!(BucketName::new("team--uploads").is_ok());
    }

    #[test]
    fn test_invalid_bucket_names() {
        assert!(BucketName::new("").is_err());
        assert!(BucketName::new("ab").is_err());
        assert!(BucketName::new("a".repeat(64)).is_err());

        assert!(BucketName::new("-bucket").is_err());
        assert!(BucketName::new("bucket-").is_err());
        assert!(BucketName::new("Bucket").is_err());

        assert!(BucketName::new("my_bucket").is_err());
        assert!(BucketName::new("my bucket").is_err());
        assert!(BucketName::new("my..bucket").is_err());

        assert!(BucketName::new("192.168.1.1").is_err());
    }

    #[test]
    fn test_host_prefix() {
        let bucket = BucketName::new("outline").unwrap();
        assert_eq!(bucket.host_prefix(), "outline.");
    }
}

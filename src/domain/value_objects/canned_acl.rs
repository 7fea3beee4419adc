use crate::domain::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// S3 canned access control list applied to an uploaded object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    AwsExecRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl CannedAcl {
    pub const ALL: [CannedAcl; 7] = [
        CannedAcl::Private,
        CannedAcl::PublicRead,
        CannedAcl::PublicReadWrite,
        CannedAcl::AuthenticatedRead,
        CannedAcl::AwsExecRead,
        CannedAcl::BucketOwnerRead,
        CannedAcl::BucketOwnerFullControl,
    ];

    /// Wire value used in the `x-amz-acl` header and POST policy fields
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
            CannedAcl::AuthenticatedRead => "authenticated-read",
            CannedAcl::AwsExecRead => "aws-exec-read",
            CannedAcl::BucketOwnerRead => "bucket-owner-read",
            CannedAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl Default for CannedAcl {
    fn default() -> Self {
        CannedAcl::Private
    }
}

impl std::fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CannedAcl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CannedAcl::ALL
            .into_iter()
            .find(|acl| acl.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownCannedAcl(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_acls() {
        assert_eq!("private".parse::<CannedAcl>(), Ok(CannedAcl::Private));
        assert_eq!("public-read".parse::<CannedAcl>(), Ok(CannedAcl::PublicRead));
        assert_eq!(
            "bucket-owner-full-control".parse::<CannedAcl>(),
            Ok(CannedAcl::BucketOwnerFullControl)
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("Private".parse::<CannedAcl>().is_err());
        assert!("world-writable".parse::<CannedAcl>().is_err());
    }

    #[test]
    fn test_wire_value_matches_display() {
        for acl in CannedAcl::ALL {
            assert_eq!(acl.to_string(), acl.as_str());
            assert_eq!(acl.as_str().parse::<CannedAcl>(), Ok(acl));
        }
    }
}

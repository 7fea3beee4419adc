use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Content type prefix required by presigned uploads unless overridden
pub const DEFAULT_CONTENT_TYPE_PREFIX: &str = "image";

/// Lifetime of a presigned POST policy, in seconds
pub const PRESIGNED_POST_EXPIRY_SECS: u64 = 3600;

/// One condition of an S3 POST policy document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCondition {
    /// `["content-length-range", min, max]`
    ContentLengthRange { min: u64, max: u64 },
    /// `["starts-with", "$<field>", "<prefix>"]`
    StartsWith { field: String, prefix: String },
    /// `{"<field>": "<value>"}`
    Equals { field: String, value: String },
}

impl PostCondition {
    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        PostCondition::StartsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        PostCondition::Equals {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl Serialize for PostCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PostCondition::ContentLengthRange { min, max } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("content-length-range")?;
                seq.serialize_element(min)?;
                seq.serialize_element(max)?;
                seq.end()
            }
            PostCondition::StartsWith { field, prefix } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("starts-with")?;
                seq.serialize_element(&format!("${}", field))?;
                seq.serialize_element(prefix)?;
                seq.end()
            }
            PostCondition::Equals { field, value } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(field, value)?;
                map.end()
            }
        }
    }
}

/// Everything a browser form needs to upload straight to the bucket
#[derive(Debug, Clone, Serialize)]
pub struct PresignedPost {
    pub url: String,
    pub fields: BTreeMap<String, String>,
    pub conditions: Vec<PostCondition>,
    pub expires_at: DateTime<Utc>,
}

use std::fmt;
use std::str::FromStr;

use object_store::path::{Path, PathPart};
use url::Url;

use crate::client::AthenaError;

/// A parsed `s3://bucket/key` object location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: Path,
}

impl ObjectLocation {
    pub fn parse(location: &str) -> Result<Self, AthenaError> {
        let invalid = |why: &str| AthenaError::InvalidLocation(format!("{location}: {why}"));

        let url = Url::parse(location).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "s3" {
            return Err(invalid("expected an s3:// URL"));
        }

        let bucket = url
            .host_str()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| invalid("missing bucket"))?
            .to_string();

        let key = Path::from_url_path(url.path()).map_err(|e| invalid(&e.to_string()))?;
        if key.as_ref().is_empty() {
            return Err(invalid("missing object key"));
        }

        Ok(Self { bucket, key })
    }

    /// Key prefixed with the bucket name, for stores that hold many buckets.
    pub(crate) fn bucket_scoped_key(&self) -> Path {
        std::iter::once(PathPart::from(self.bucket.as_str()))
            .chain(self.key.parts())
            .collect()
    }
}

impl FromStr for ObjectLocation {
    type Err = AthenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

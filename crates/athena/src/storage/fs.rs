use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::ObjectStore;
use quarry_core::Credentials;
use tracing::debug;

use super::location::ObjectLocation;
use crate::client::AthenaError;

/// Authenticated handle for whole-object reads and writes at `s3://` locations.
///
/// Construction performs no I/O; credential or network problems surface on
/// the first [`read`](Self::read) or [`write`](Self::write). Cloning is cheap
/// and clones share the same backend, including any S3 clients already built.
#[derive(Clone)]
pub struct RemoteFs {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    /// One S3 store per target bucket, built on first use from static
    /// credentials and reused afterwards.
    S3 {
        credentials: Arc<Credentials>,
        stores: Arc<Mutex<HashMap<String, Arc<dyn ObjectStore>>>>,
    },
    /// One store for every bucket; keys are `{bucket}/{key}`.
    Store(Arc<dyn ObjectStore>),
}

impl RemoteFs {
    /// S3 handle for the credentials' region.
    pub fn s3(credentials: &Credentials) -> Self {
        Self {
            backend: Backend::S3 {
                credentials: Arc::new(credentials.clone()),
                stores: Arc::default(),
            },
        }
    }

    /// Handle over an arbitrary store (in-memory, local filesystem, ...).
    ///
    /// The bucket of each location becomes the first path segment inside
    /// `store`, so `s3://a/x.csv` and `s3://b/x.csv` stay distinct.
    pub fn from_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            backend: Backend::Store(store),
        }
    }

    fn resolve(&self, location: &ObjectLocation) -> Result<(Arc<dyn ObjectStore>, Path), AthenaError> {
        match &self.backend {
            Backend::S3 { credentials, stores } => {
                let mut stores = stores.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(store) = stores.get(&location.bucket) {
                    return Ok((store.clone(), location.key.clone()));
                }

                let store = s3_store(credentials, &location.bucket)?;
                stores.insert(location.bucket.clone(), store.clone());
                debug!(bucket = %location.bucket, region = %credentials.region, "Built S3 store");
                Ok((store, location.key.clone()))
            }
            Backend::Store(store) => Ok((store.clone(), location.bucket_scoped_key())),
        }
    }

    /// Read the whole object at `location`.
    pub async fn read(&self, location: &str) -> Result<Bytes, AthenaError> {
        let parsed = ObjectLocation::parse(location)?;
        let (store, path) = self.resolve(&parsed)?;

        let data = store.get(&path).await?.bytes().await?;
        debug!(location = %parsed, bytes = data.len(), "Read remote object");
        Ok(data)
    }

    /// Replace the object at `location` with `data` in a single put.
    /// Returns the number of bytes written.
    pub async fn write(&self, location: &str, data: Bytes) -> Result<u64, AthenaError> {
        let parsed = ObjectLocation::parse(location)?;
        let (store, path) = self.resolve(&parsed)?;

        let len = data.len() as u64;
        store.put(&path, data.into()).await?;
        debug!(location = %parsed, bytes = len, "Wrote remote object");
        Ok(len)
    }
}

fn s3_store(creds: &Credentials, bucket: &str) -> Result<Arc<dyn ObjectStore>, AthenaError> {
    let mut builder = AmazonS3Builder::new()
        .with_region(&creds.region)
        .with_bucket_name(bucket)
        .with_access_key_id(&creds.access_key_id)
        .with_secret_access_key(&creds.secret_access_key);
    if let Some(ref token) = creds.session_token {
        builder = builder.with_token(token);
    }
    Ok(Arc::new(builder.build()?))
}

impl fmt::Debug for RemoteFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            Backend::S3 { credentials, .. } => f
                .debug_struct("RemoteFs")
                .field("backend", &"s3")
                .field("region", &credentials.region)
                .finish(),
            Backend::Store(store) => f
                .debug_struct("RemoteFs")
                .field("backend", &store.to_string())
                .finish(),
        }
    }
}

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tracing::debug;

use crate::config::{S3Config, StorageConfig};

/// Destination for uploaded files. Returns where the object ended up.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String>;
}

pub async fn from_config(cfg: &StorageConfig) -> anyhow::Result<Arc<dyn StorageClient>> {
    let storage: Arc<dyn StorageClient> = match cfg {
        StorageConfig::Local { root } => Arc::new(LocalStorage::new(root)),
        StorageConfig::S3(s3) => Arc::new(S3Storage::connect(s3).await?),
    };
    Ok(storage)
}

/// Writes objects below a directory on the local filesystem.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<String> {
        let path = self.root.join(key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create upload dir {}", dir.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        debug!(path = %path.display(), bytes = body.len(), "stored upload on disk");
        Ok(key.to_string())
    }
}

/// S3 or MinIO bucket. Stored paths read `<bucket>/<key>`.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn connect(cfg: &S3Config) -> anyhow::Result<Self> {
        if cfg.bucket.trim().is_empty() {
            anyhow::bail!("S3_BUCKET must not be empty");
        }
        if !(cfg.endpoint.starts_with("http://") || cfg.endpoint.starts_with("https://")) {
            anyhow::bail!("S3_ENDPOINT must be an http(s) URL, got {:?}", cfg.endpoint);
        }

        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "movie-api-env",
            ))
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        debug!(endpoint = %cfg.endpoint, bucket = %cfg.bucket, "s3 upload storage ready");
        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }

    fn object_path(&self, key: &str) -> String {
        format!("{}/{}", self.bucket, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("s3 put_object {}", self.object_path(key)))?;
        debug!(bucket = %self.bucket, key = %key, bytes = size, "stored upload in bucket");
        Ok(self.object_path(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_storage_writes_below_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = LocalStorage::new(dir.path());

        let path = storage
            .put_object("upload/1700000000000-42.png", Bytes::from_static(b"\x89PNG"), "image/png")
            .await
            .expect("put_object");

        assert_eq!(path, "upload/1700000000000-42.png");
        let written = std::fs::read(dir.path().join("upload/1700000000000-42.png")).expect("read back");
        assert_eq!(written, b"\x89PNG");
    }

    fn minio() -> S3Config {
        S3Config {
            endpoint: "http://127.0.0.1:9000".into(),
            bucket: "posters".into(),
            access_key: "minioadmin".into(),
            secret_key: "minioadmin".into(),
            region: "us-east-1".into(),
        }
    }

    #[tokio::test]
    async fn s3_backend_is_selected_from_config() {
        assert!(from_config(&StorageConfig::S3(minio())).await.is_ok());
    }

    #[tokio::test]
    async fn s3_paths_are_bucket_prefixed() {
        let storage = S3Storage::connect(&minio()).await.expect("client builds offline");
        assert_eq!(
            storage.object_path("upload/1700000000000-42.png"),
            "posters/upload/1700000000000-42.png"
        );
        assert_eq!(storage.object_path("/a.gif"), "posters/a.gif");
    }

    #[tokio::test]
    async fn s3_config_is_checked_before_connecting() {
        let mut cfg = minio();
        cfg.bucket = " ".into();
        assert!(S3Storage::connect(&cfg).await.is_err());

        let mut cfg = minio();
        cfg.endpoint = "127.0.0.1:9000".into();
        let err = S3Storage::connect(&cfg).await.err().expect("scheme required");
        assert!(err.to_string().contains("S3_ENDPOINT"));
    }
}

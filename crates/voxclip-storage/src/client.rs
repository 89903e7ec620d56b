//! R2 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::store::{content_type_for, validate_key, ObjectStore};

/// Configuration for R2 client.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Public base URL for uploaded objects (custom domain or r2.dev)
    pub public_base_url: Option<String>,
}

impl R2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("R2_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("R2_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("R2_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("R2_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("R2_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("R2_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("R2_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("R2_BUCKET_NAME not set"))?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("R2_PUBLIC_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        })
    }

    /// URL an uploaded key is reachable at.
    pub fn object_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("s3://{}/{}", self.bucket_name, key),
        }
    }
}

/// Cloudflare R2 storage client.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    config: R2Config,
}

impl R2Client {
    /// Create a new R2 client from configuration.
    pub async fn new(config: R2Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = R2Config::from_env()?;
        Self::new(config).await
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket_name
    }

    /// Upload a file to R2.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Check connectivity to R2 by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket_name)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("R2 connectivity check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn upload(&self, local_path: &Path, blob_name: &str) -> StorageResult<String> {
        validate_key(blob_name)?;
        if !tokio::fs::try_exists(local_path).await? {
            return Err(StorageError::not_found(local_path.display().to_string()));
        }

        self.upload_file(local_path, blob_name, content_type_for(blob_name))
            .await?;
        Ok(self.config.object_url(blob_name))
    }
}

impl std::fmt::Debug for R2Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("R2Client")
            .field("bucket", &self.config.bucket_name)
            .field("endpoint", &self.config.endpoint_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(public: Option<&str>) -> R2Config {
        R2Config {
            endpoint_url: "https://account.r2.cloudflarestorage.com".into(),
            access_key_id: "key".into(),
            secret_access_key: "secret".into(),
            bucket_name: "voxclip".into(),
            region: "auto".into(),
            public_base_url: public.map(String::from),
        }
    }

    #[test]
    fn test_object_url_with_public_base() {
        let config = config(Some("https://cdn.example.com/"));
        assert_eq!(
            config.object_url("clips/abc/abc-001.wav"),
            "https://cdn.example.com/clips/abc/abc-001.wav"
        );
    }

    #[test]
    fn test_object_url_without_public_base() {
        let config = config(None);
        assert_eq!(
            config.object_url("clips/abc/abc-001.wav"),
            "s3://voxclip/clips/abc/abc-001.wav"
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_key_before_network() {
        let client = R2Client::new(config(None)).await.unwrap();
        let err = client
            .upload(Path::new("/tmp/whatever.wav"), "../escape.wav")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let client = R2Client::new(config(None)).await.unwrap();
        let err = client
            .upload(Path::new("/nonexistent/voxclip/a.wav"), "clips/a/a-001.wav")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}

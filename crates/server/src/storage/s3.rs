use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    types::ServerSideEncryption,
    Client,
};
use shared_types::AppError;

use super::ObjectStore;

/// Read an env var, trying the primary name first then a fallback.
pub fn env_or(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .or_else(|| std::env::var(fallback).ok())
}

fn required(primary: &str, fallback: &str) -> Result<String, AppError> {
    env_or(primary, fallback)
        .ok_or_else(|| AppError::internal(format!("{primary} or {fallback} must be set")))
}

/// S3-compatible bucket with public-read objects.
/// All uploads are encrypted with SSE-S3 (AES256).
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    endpoint: String,
    public_base_url: Option<String>,
}

impl S3ObjectStore {
    /// Build a store for `bucket` from environment variables.
    ///
    /// Supports both Fly/Tigris (`AWS_*`) and local MinIO (`S3_*`) naming:
    ///   - `AWS_ENDPOINT_URL_S3` / `S3_ENDPOINT`
    ///   - `AWS_ACCESS_KEY_ID`   / `S3_ACCESS_KEY`
    ///   - `AWS_SECRET_ACCESS_KEY` / `S3_SECRET_KEY`
    ///   - `AWS_REGION`          / `S3_REGION`
    pub fn from_env(bucket: &str, public_base_url: Option<String>) -> Result<Self, AppError> {
        let endpoint = required("AWS_ENDPOINT_URL_S3", "S3_ENDPOINT")?;
        let access_key = required("AWS_ACCESS_KEY_ID", "S3_ACCESS_KEY")?;
        let secret_key = required("AWS_SECRET_ACCESS_KEY", "S3_SECRET_KEY")?;
        let region =
            env_or("AWS_REGION", "S3_REGION").unwrap_or_else(|| "us-east-1".to_string());

        let creds = Credentials::new(&access_key, &secret_key, None, None, "env");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(&endpoint)
            .region(Region::new(region))
            .credentials_provider(creds)
            .force_path_style(true)
            .behavior_version_latest()
            .build();

        Ok(Self {
            client: Client::from_conf(config),
            bucket: bucket.to_string(),
            endpoint,
            public_base_url,
        })
    }

    /// Create the bucket if it doesn't exist yet.
    pub async fn ensure_bucket(&self) {
        let exists = self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok();

        if exists {
            tracing::info!(bucket = %self.bucket, "bucket already exists");
            return;
        }

        match self.client.create_bucket().bucket(&self.bucket).send().await {
            Ok(_) => tracing::info!(bucket = %self.bucket, "bucket created"),
            Err(e) => tracing::warn!(bucket = %self.bucket, error = %e, "failed to create bucket"),
        }
    }
}

/// Public URL for `key` in `bucket`.
///
/// An explicit base URL wins. Otherwise Tigris uses virtual-hosted style
/// (`https://{bucket}.fly.storage.tigris.dev/{key}`) and everything else path
/// style (`http://localhost:9000/{bucket}/{key}`).
fn build_public_url(endpoint: &str, base: Option<&str>, bucket: &str, key: &str) -> String {
    if let Some(base) = base {
        return format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key);
    }
    if endpoint.contains("tigris") {
        let host = endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        format!("https://{}.{}/{}", bucket, host, key)
    } else {
        format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .server_side_encryption(ServerSideEncryption::Aes256)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                let svc = e.into_service_error();
                tracing::error!(bucket = %self.bucket, key, error = ?svc, "S3 PutObject failed");
                AppError::upstream(format!("S3 upload failed: {svc}"))
            })?;

        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        build_public_url(&self.endpoint, self.public_base_url.as_deref(), &self.bucket, key)
    }
}

use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Presigned upload URLs stay valid for ten minutes.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// Key prefixes accepted for image uploads.
pub const UPLOAD_TARGETS: &[&str] = &["posts", "events"];

/// StorageService
///
/// Object storage for post and event images. The database keeps only the
/// object key; the browser uploads the bytes directly with a presigned URL.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if missing. Only called in `Env::Local` (MinIO).
    async fn ensure_bucket_exists(&self) -> AppResult<()>;

    /// Returns a signed PUT URL for `key`, constrained to `content_type`.
    async fn get_presigned_upload_url(&self, key: &str, content_type: &str) -> AppResult<String>;
}

/// S3StorageClient
///
/// AWS SDK client pointed at any S3-compatible endpoint. Path-style
/// addressing is forced so MinIO works locally.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        // CreateBucket fails when the bucket is already there; that is fine.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!("create_bucket '{}': {}", self.bucket_name, e);
        }
        Ok(())
    }

    async fn get_presigned_upload_url(&self, key: &str, content_type: &str) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL)
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }
}

/// sanitize_key
///
/// Drops empty, `.` and `..` path segments from a user-supplied key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// image_key
///
/// Builds `<target>/<uuid>-<filename>` for an upload request. Only image
/// content types and the known targets are accepted.
pub fn image_key(target: &str, filename: &str, file_type: &str) -> AppResult<String> {
    if !UPLOAD_TARGETS.contains(&target) {
        return Err(AppError::Validation(format!(
            "Destino de upload inválido: '{target}'."
        )));
    }
    if !file_type.starts_with("image/") {
        return Err(AppError::Validation(
            "Apenas imagens podem ser enviadas.".to_string(),
        ));
    }

    let name = sanitize_key(filename).replace('/', "_");
    if name.is_empty() {
        return Err(AppError::Validation("Nome de arquivo inválido.".to_string()));
    }
    Ok(format!("{target}/{}-{name}", Uuid::new_v4()))
}

/// MockStorageService
///
/// In-memory stand-in used by the tests; never touches the network.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, every call fails with `AppError::Storage`.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        Ok(())
    }

    async fn get_presigned_upload_url(&self, key: &str, _content_type: &str) -> AppResult<String> {
        if self.should_fail {
            return Err(AppError::Storage("mock storage failure".to_string()));
        }

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}

pub type StorageState = Arc<dyn StorageService>;

use crate::config::BucketDefinition;
use crate::utils::error::{ImageSourceError, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use std::time::Instant;

/// Automatic transport-level retries on top of the first attempt.
pub const MAX_RETRIES: u32 = 2;

const CREDENTIALS_PROVIDER_NAME: &str = "s3-image-source";

/// Downloads whole objects from one configured bucket.
#[derive(Debug, Clone)]
pub struct RemoteDownloader {
    client: S3Client,
}

impl RemoteDownloader {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// 依 bucket 設定建立 S3 client
    ///
    /// `AppId` 為空時改用預設的憑證鏈 (環境變數、profile、IMDS)。
    pub async fn connect(bucket: &BucketDefinition) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(bucket.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(MAX_RETRIES + 1));

        if bucket.has_static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                bucket.access_id.clone(),
                bucket.access_secret.clone(),
                bucket.session_token().map(str::to_string),
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }

        if let Some(endpoint) = bucket.endpoint_url() {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        tracing::debug!(
            "Created S3 client for bucket '{}' (region={}, endpoint={:?})",
            bucket.name,
            bucket.region,
            bucket.endpoint_url()
        );

        Self::new(S3Client::from_conf(config))
    }

    /// Fetch `<Prefix>/<object_key>` from `Dist` and buffer it in memory.
    pub async fn download(&self, bucket: &BucketDefinition, object_key: &str) -> Result<Vec<u8>> {
        let key = bucket.remote_key(object_key);
        let start = Instant::now();

        let resp = self
            .client
            .get_object()
            .bucket(&bucket.remote_bucket_id)
            .key(&key)
            .send()
            .await
            .map_err(|e| download_error(bucket, &key, e))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| download_error(bucket, &key, e))?;

        let data = data.into_bytes().to_vec();
        tracing::info!(
            "Downloaded s3://{}/{} ({} bytes, {:.1}ms)",
            bucket.remote_bucket_id,
            key,
            data.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(data)
    }
}

fn download_error<E>(bucket: &BucketDefinition, key: &str, err: E) -> ImageSourceError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    tracing::warn!(
        "Download failed for bucket '{}' key '{}': {}",
        bucket.name,
        key,
        message
    );
    ImageSourceError::RemoteDownloadError {
        bucket: bucket.name.clone(),
        remote_bucket: bucket.remote_bucket_id.clone(),
        key: key.to_string(),
        message,
        source: Box::new(err),
    }
}

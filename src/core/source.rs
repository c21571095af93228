use crate::config::{BucketDefinition, SourceConfig, SourceConfiguration};
use crate::core::local::LocalMirror;
use crate::core::remote::RemoteDownloader;
use crate::core::resolver;
use crate::domain::model::{ImageRequest, ImageSourceType};
use crate::domain::ports::ImageSource;
use crate::utils::error::{ImageSourceError, Result};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use http::Method;
use std::collections::HashMap;
use tokio::sync::OnceCell;

/// Query parameter carrying `<bucketName>/<objectKey>`.
pub const S3_QUERY_KEY: &str = "s3";

/// Image source backed by S3 buckets, with optional local mirrors.
///
/// A bucket with `EnableLocal = true` is served only from its mirror: a missing
/// or unreadable mirror file fails the request rather than falling back to S3.
pub struct S3ImageSource {
    config: SourceConfiguration,
    downloaders: HashMap<String, OnceCell<RemoteDownloader>>,
    degraded: bool,
}

impl S3ImageSource {
    /// 載入並驗證 bucket 設定檔，失敗時回傳錯誤由呼叫端決定是否中止
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let configuration = SourceConfiguration::from_file(&config.aws_config_path)?;
        configuration.validate()?;
        Ok(Self::from_configuration(configuration))
    }

    /// Lenient counterpart of [`S3ImageSource::new`].
    ///
    /// Buckets failing validation are logged and still served as parsed. Only a
    /// file that cannot be read or parsed leaves the source with zero buckets, in
    /// which case every request resolves to `BucketNotFound`.
    pub fn new_degraded(config: &SourceConfig) -> Self {
        let configuration = match SourceConfiguration::from_file(&config.aws_config_path) {
            Ok(configuration) => configuration,
            Err(e) => {
                tracing::error!(
                    "Decode {} error: {}; S3 source starts with no buckets",
                    config.aws_config_path.display(),
                    e
                );
                let mut source = Self::from_configuration(SourceConfiguration::default());
                source.degraded = true;
                return source;
            }
        };

        let invalid = configuration.invalid_buckets();
        for (name, e) in &invalid {
            tracing::warn!("Bucket '{}' failed validation, serving it as configured: {}", name, e);
        }
        let degraded = !invalid.is_empty();

        let mut source = Self::from_configuration(configuration);
        source.degraded = degraded;
        source
    }

    pub fn from_configuration(config: SourceConfiguration) -> Self {
        let mut downloaders = HashMap::new();
        for bucket in config.buckets().iter().filter(|b| !b.local_mirror_enabled) {
            downloaders
                .entry(bucket.name.clone())
                .or_insert_with(OnceCell::new);
        }
        Self {
            config,
            downloaders,
            degraded: false,
        }
    }

    pub fn configuration(&self) -> &SourceConfiguration {
        &self.config
    }

    /// True when [`S3ImageSource::new_degraded`] could not load the file or
    /// accepted buckets that failed validation.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn s3_param(request: &ImageRequest) -> Option<String> {
        request
            .query_param(S3_QUERY_KEY)
            .filter(|value| !value.is_empty())
    }

    async fn fetch_image(&self, path: &str) -> Result<Vec<u8>> {
        let resolved = resolver::resolve(&self.config, path)?;
        let bucket = resolved.bucket;

        if bucket.local_mirror_enabled {
            tracing::debug!("Serving '{}' from local mirror of '{}'", path, bucket.name);
            return LocalMirror::for_bucket(bucket)
                .read(resolved.object_key)
                .await;
        }

        let downloader = self.downloader(bucket).await?;
        downloader.download(bucket, resolved.object_key).await
    }

    async fn downloader(&self, bucket: &BucketDefinition) -> Result<&RemoteDownloader> {
        // 只有遠端 bucket 會建立 client
        let cell = self
            .downloaders
            .get(&bucket.name)
            .ok_or_else(|| ImageSourceError::BucketNotFound {
                path: bucket.name.clone(),
            })?;
        Ok(cell.get_or_init(|| RemoteDownloader::connect(bucket)).await)
    }
}

#[async_trait]
impl ImageSource for S3ImageSource {
    fn source_type(&self) -> ImageSourceType {
        ImageSourceType::S3
    }

    fn matches(&self, request: &ImageRequest) -> bool {
        request.method() == Method::GET && Self::s3_param(request).is_some()
    }

    async fn get_image(&self, request: &ImageRequest) -> Result<Vec<u8>> {
        let path = Self::s3_param(request).ok_or(ImageSourceError::MissingParameter {
            param: S3_QUERY_KEY,
        })?;

        let cancellation = request.cancellation();
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                tracing::warn!("Fetch of '{}' cancelled", path);
                Err(ImageSourceError::Cancelled)
            }
            result = self.fetch_image(&path) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> S3ImageSource {
        let config = SourceConfiguration::from_toml_str(
            r#"
[[S3.Buckets]]
Name = "b1"
Dist = "images-prod"
Region = "us-east-1"

[[S3.Buckets]]
Name = "m1"
EnableLocal = true
LocalDir = "/nonexistent-mirror"
"#,
        )
        .unwrap();
        S3ImageSource::from_configuration(config)
    }

    fn request(uri: &str) -> ImageRequest {
        ImageRequest::get(uri.parse().unwrap())
    }

    #[test]
    fn test_matches_requires_get_and_param() {
        let source = source();
        assert!(source.matches(&request("/?s3=b1/img.png")));
        assert!(source.matches(&request("/?s3=anything")));
        assert!(!source.matches(&request("/?url=http://x/img.png")));
        assert!(!source.matches(&request("/?s3=")));
        assert!(!source.matches(&request("/")));

        let post = ImageRequest::new(Method::POST, "/?s3=b1/img.png".parse().unwrap());
        assert!(!source.matches(&post));
    }

    #[test]
    fn test_downloaders_only_for_remote_buckets() {
        let source = source();
        assert!(source.downloaders.contains_key("b1"));
        assert!(!source.downloaders.contains_key("m1"));
        assert_eq!(source.source_type(), ImageSourceType::S3);
    }

    #[tokio::test]
    async fn test_get_image_missing_param() {
        let source = source();
        let err = source.get_image(&request("/?s3=")).await.unwrap_err();
        assert!(matches!(err, ImageSourceError::MissingParameter { param: "s3" }));
    }

    #[tokio::test]
    async fn test_get_image_unknown_bucket_and_malformed_path() {
        let source = source();
        let err = source
            .get_image(&request("/?s3=unknown/img.png"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = source.get_image(&request("/?s3=b1")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_local_read_failure_does_not_fall_back() {
        let source = source();
        let err = source
            .get_image(&request("/?s3=m1/img.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageSourceError::LocalReadError { .. }));
    }
}

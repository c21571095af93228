use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ImageSourceError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {reason} (value={value})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing '{param}' query parameter")]
    MissingParameter { param: &'static str },

    #[error("No image source accepts request '{uri}'")]
    NoSourceMatched { uri: String },

    #[error("Image not found: no bucket configured for '{path}'")]
    BucketNotFound { path: String },

    #[error("Invalid object key: {key}")]
    InvalidKey { key: String },

    #[error("Error reading local image: (path={}) (err={source})", path.display())]
    LocalReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error downloading image: (bucket={bucket}) (dist={remote_bucket}) (key={key}) (err={message})")]
    RemoteDownloadError {
        bucket: String,
        remote_bucket: String,
        key: String,
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Request cancelled before the image was fetched")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Request,
    Storage,
}

impl ImageSourceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::MissingParameter { .. }
            | Self::NoSourceMatched { .. }
            | Self::BucketNotFound { .. }
            | Self::InvalidKey { .. }
            | Self::Cancelled => ErrorCategory::Request,
            Self::LocalReadError { .. } | Self::RemoteDownloadError { .. } => ErrorCategory::Storage,
        }
    }

    /// 請求是否指向不存在的 bucket（由呼叫端對應為 404）
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BucketNotFound { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                format!("Bucket configuration is invalid: {}", self)
            }
            Self::MissingParameter { param } => {
                format!("Request has no '{}' parameter", param)
            }
            Self::NoSourceMatched { uri } => {
                format!("'{}' does not name an image in any supported form", uri)
            }
            Self::BucketNotFound { path } => format!("No image found for '{}'", path),
            Self::InvalidKey { key } => format!("'{}' is not a valid image key", key),
            Self::LocalReadError { path, .. } => {
                format!("Could not read mirrored image {}", path.display())
            }
            Self::RemoteDownloadError { bucket, key, .. } => {
                format!("Could not download '{}' from bucket '{}'", key, bucket)
            }
            Self::Cancelled => "Request was cancelled".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Check the [[S3.Buckets]] entries and any ${VAR} placeholders in the config file"
            }
            Self::MissingParameter { .. } => "Pass the image as s3=<bucket>/<key>",
            Self::NoSourceMatched { .. } => {
                "Use a GET request with a query parameter of a registered source, e.g. s3=<bucket>/<key>"
            }
            Self::BucketNotFound { .. } => {
                "Make sure the bucket name before the first '/' matches a configured Name"
            }
            Self::InvalidKey { .. } => "Remove '..' segments from the object key",
            Self::LocalReadError { .. } => {
                "Verify LocalDir and that the mirrored file exists and is readable"
            }
            Self::RemoteDownloadError { .. } => {
                "Verify credentials, region, endpoint and that the object exists"
            }
            Self::Cancelled => "Retry the request",
        }
    }
}

pub type Result<T> = std::result::Result<T, ImageSourceError>;

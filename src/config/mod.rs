#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use std::path::PathBuf;

pub use toml_config::{BucketDefinition, SourceConfiguration};

/// Settings the enclosing service hands to image sources at construction.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Path to the `[[S3.Buckets]]` TOML file.
    pub aws_config_path: PathBuf,
}

impl SourceConfig {
    pub fn new(aws_config_path: impl Into<PathBuf>) -> Self {
        Self {
            aws_config_path: aws_config_path.into(),
        }
    }
}

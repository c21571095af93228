pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use self::config::cli::CliConfig;

pub use self::config::{BucketDefinition, SourceConfig, SourceConfiguration};
pub use self::core::{
    registry::ImageSourceRegistry,
    source::{S3ImageSource, S3_QUERY_KEY},
};
pub use self::domain::{
    model::{ImageRequest, ImageSourceType},
    ports::ImageSource,
};
pub use self::utils::error::{ImageSourceError, Result};

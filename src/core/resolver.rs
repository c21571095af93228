use crate::config::{BucketDefinition, SourceConfiguration};
use crate::domain::model::RequestKey;
use crate::utils::error::{ImageSourceError, Result};

/// A query value matched against the configured buckets.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedImage<'a> {
    pub bucket: &'a BucketDefinition,
    pub object_key: &'a str,
}

/// Map `<bucketName>/<objectKey>` onto a configured bucket.
///
/// A value without `/` or naming an unknown bucket is `BucketNotFound`.
/// Keys with `..` segments are refused so that a mirror lookup can never leave
/// `LocalDir`.
pub fn resolve<'a>(config: &'a SourceConfiguration, raw: &'a str) -> Result<ResolvedImage<'a>> {
    let not_found = || ImageSourceError::BucketNotFound {
        path: raw.to_string(),
    };

    let Some(key) = RequestKey::parse(raw) else {
        tracing::debug!("No '/' in image path '{}'", raw);
        return Err(not_found());
    };

    let bucket = config.find_bucket(key.bucket_name).ok_or_else(not_found)?;

    if key.object_key.split('/').any(|segment| segment == "..") {
        return Err(ImageSourceError::InvalidKey {
            key: key.object_key.to_string(),
        });
    }

    Ok(ResolvedImage {
        bucket,
        object_key: key.object_key,
    })
}

use crate::domain::model::{ImageRequest, ImageSourceType};
use crate::utils::error::Result;
use async_trait::async_trait;

/// One pluggable strategy for turning a request into image bytes.
#[async_trait]
pub trait ImageSource: Send + Sync {
    fn source_type(&self) -> ImageSourceType;

    /// Whether this source claims the request. Must not perform I/O.
    fn matches(&self, request: &ImageRequest) -> bool;

    async fn get_image(&self, request: &ImageRequest) -> Result<Vec<u8>>;
}

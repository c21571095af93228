use crate::domain::model::{ImageRequest, ImageSourceType};
use crate::domain::ports::ImageSource;
use crate::utils::error::{ImageSourceError, Result};

/// Ordered set of image sources, assembled explicitly at startup.
#[derive(Default)]
pub struct ImageSourceRegistry {
    sources: Vec<Box<dyn ImageSource>>,
}

impl ImageSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Box<dyn ImageSource>) -> Result<()> {
        let source_type = source.source_type();
        if self.get(source_type).is_some() {
            return Err(ImageSourceError::ConfigError {
                message: format!("Image source '{}' is already registered", source_type),
            });
        }
        tracing::info!("Registered image source '{}'", source_type);
        self.sources.push(source);
        Ok(())
    }

    pub fn get(&self, source_type: ImageSourceType) -> Option<&dyn ImageSource> {
        self.sources
            .iter()
            .find(|source| source.source_type() == source_type)
            .map(|source| &**source)
    }

    /// First registered source that claims the request.
    pub fn source_for(&self, request: &ImageRequest) -> Option<&dyn ImageSource> {
        self.sources
            .iter()
            .find(|source| source.matches(request))
            .map(|source| &**source)
    }

    pub async fn get_image(&self, request: &ImageRequest) -> Result<Vec<u8>> {
        let source = self
            .source_for(request)
            .ok_or_else(|| ImageSourceError::NoSourceMatched {
                uri: request.uri().to_string(),
            })?;
        tracing::debug!("Dispatching {} to '{}' source", request.uri(), source.source_type());
        source.get_image(request).await
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticSource {
        source_type: ImageSourceType,
        param: &'static str,
        bytes: &'static [u8],
    }

    #[async_trait]
    impl ImageSource for StaticSource {
        fn source_type(&self) -> ImageSourceType {
            self.source_type
        }

        fn matches(&self, request: &ImageRequest) -> bool {
            request.query_param(self.param).is_some()
        }

        async fn get_image(&self, _request: &ImageRequest) -> Result<Vec<u8>> {
            Ok(self.bytes.to_vec())
        }
    }

    fn registry() -> ImageSourceRegistry {
        let mut registry = ImageSourceRegistry::new();
        registry
            .register(Box::new(StaticSource {
                source_type: ImageSourceType::new("file"),
                param: "file",
                bytes: b"from-file",
            }))
            .unwrap();
        registry
            .register(Box::new(StaticSource {
                source_type: ImageSourceType::S3,
                param: "s3",
                bytes: b"from-s3",
            }))
            .unwrap();
        registry
    }

    #[test]
    fn test_register_rejects_duplicate_type() {
        let mut registry = registry();
        let result = registry.register(Box::new(StaticSource {
            source_type: ImageSourceType::S3,
            param: "other",
            bytes: b"",
        }));
        assert!(result.is_err());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_to_matching_source() {
        let registry = registry();
        let request = ImageRequest::get("/?s3=b1/img.png".parse().unwrap());
        assert_eq!(
            registry.source_for(&request).unwrap().source_type(),
            ImageSourceType::S3
        );
        assert_eq!(registry.get_image(&request).await.unwrap(), b"from-s3");
    }

    #[tokio::test]
    async fn test_unclaimed_request() {
        let registry = registry();
        let request = ImageRequest::get("/?width=10".parse().unwrap());
        assert!(registry.source_for(&request).is_none());
        match registry.get_image(&request).await {
            Err(ImageSourceError::NoSourceMatched { uri }) => assert_eq!(uri, "/?width=10"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

use http::{Method, Uri};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Key under which an image source is registered with the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSourceType(&'static str);

impl ImageSourceType {
    pub const S3: Self = Self("s3");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ImageSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Inbound request as seen by an image source.
///
/// Carries the request-scoped cancellation token so that a fetch can be
/// abandoned when the HTTP layer drops the request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    method: Method,
    uri: Uri,
    cancellation: CancellationToken,
}

impl ImageRequest {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn get(uri: Uri) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// 取得第一個符合的 query 參數 (已 percent-decode)
    pub fn query_param(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

impl<B> From<&http::Request<B>> for ImageRequest {
    fn from(request: &http::Request<B>) -> Self {
        Self::new(request.method().clone(), request.uri().clone())
    }
}

/// `<bucketName>/<objectKey>` split on the first `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestKey<'a> {
    pub bucket_name: &'a str,
    pub object_key: &'a str,
}

impl<'a> RequestKey<'a> {
    /// Returns `None` when the value has no `/` separator.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let (bucket_name, object_key) = raw.split_once('/')?;
        Some(Self {
            bucket_name,
            object_key,
        })
    }
}

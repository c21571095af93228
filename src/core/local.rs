use crate::config::BucketDefinition;
use crate::utils::error::{ImageSourceError, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Read-only view of a bucket's local mirror directory.
#[derive(Debug, Clone)]
pub struct LocalMirror {
    base_path: String,
}

impl LocalMirror {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn for_bucket(bucket: &BucketDefinition) -> Self {
        Self::new(bucket.local_mirror_dir.clone())
    }

    pub fn path_for(&self, object_key: &str) -> PathBuf {
        PathBuf::from(format!(
            "{}/{}",
            self.base_path.trim_end_matches('/'),
            object_key.trim_start_matches('/')
        ))
    }

    /// 讀取整個檔案；空檔案視為合法的零長度影像
    pub async fn read(&self, object_key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(object_key);
        let data = read_to_end(&path).await?;
        tracing::debug!("Read {} bytes from mirror {}", data.len(), path.display());
        Ok(data)
    }
}

async fn read_to_end(path: &Path) -> Result<Vec<u8>> {
    let read_error = |source: std::io::Error| ImageSourceError::LocalReadError {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).await.map_err(read_error)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await.map_err(read_error)?;
    Ok(buf)
}

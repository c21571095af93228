use crate::utils::error::{ImageSourceError, Result};
use crate::utils::validation::{self, Validate};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// 整份 bucket 設定檔
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfiguration {
    #[serde(rename = "S3", default)]
    pub s3: S3Section,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Section {
    #[serde(rename = "Buckets", default)]
    pub buckets: Vec<BucketDefinition>,
}

/// 單一遠端 bucket 的設定
#[derive(Clone, Default, Deserialize)]
pub struct BucketDefinition {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Dist", default)]
    pub remote_bucket_id: String,
    #[serde(rename = "Prefix", default)]
    pub key_prefix: String,

    #[serde(rename = "EndPoint", default)]
    pub endpoint: String,
    #[serde(rename = "AppId", default)]
    pub access_id: String,
    #[serde(rename = "AppKey", default)]
    pub access_secret: String,
    #[serde(rename = "AppToken", default)]
    pub session_token: String,
    #[serde(rename = "Region", default)]
    pub region: String,

    #[serde(rename = "EnableLocal", default)]
    pub local_mirror_enabled: bool,
    #[serde(rename = "LocalDir", default)]
    pub local_mirror_dir: String,
}

impl fmt::Debug for BucketDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketDefinition")
            .field("name", &self.name)
            .field("remote_bucket_id", &self.remote_bucket_id)
            .field("key_prefix", &self.key_prefix)
            .field("endpoint", &self.endpoint)
            .field("access_id", &self.access_id)
            .field("access_secret", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("region", &self.region)
            .field("local_mirror_enabled", &self.local_mirror_enabled)
            .field("local_mirror_dir", &self.local_mirror_dir)
            .finish()
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl BucketDefinition {
    pub fn endpoint(&self) -> Option<&str> {
        non_empty(&self.endpoint)
    }

    pub fn session_token(&self) -> Option<&str> {
        non_empty(&self.session_token)
    }

    pub fn has_static_credentials(&self) -> bool {
        !self.access_id.is_empty()
    }

    /// 沒有 scheme 的 EndPoint 視為純 HTTP
    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint().map(|endpoint| {
            if endpoint.contains("://") {
                endpoint.to_string()
            } else {
                format!("http://{}", endpoint)
            }
        })
    }

    /// Object key in the remote bucket: `<prefix>/<key>` with slashes trimmed.
    pub fn remote_key(&self, object_key: &str) -> String {
        let key = object_key.trim_start_matches('/');
        let prefix = self.key_prefix.trim_matches('/');
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", prefix, key)
        }
    }
}

impl SourceConfiguration {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ImageSourceError::ConfigError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded {} bucket definition(s) from {}",
            config.buckets().len(),
            path.display()
        );
        Ok(config)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ImageSourceError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${S3_APP_KEY})，未定義的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ImageSourceError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn buckets(&self) -> &[BucketDefinition] {
        &self.s3.buckets
    }

    pub fn is_empty(&self) -> bool {
        self.s3.buckets.is_empty()
    }

    /// 逐一驗證 bucket，回傳未通過驗證者的名稱與錯誤
    pub fn invalid_buckets(&self) -> Vec<(&str, ImageSourceError)> {
        self.buckets()
            .iter()
            .filter_map(|bucket| {
                bucket
                    .validate()
                    .err()
                    .map(|e| (bucket.name.as_str(), e))
            })
            .collect()
    }

    /// 依名稱查找 bucket，重複時以第一個為準
    pub fn find_bucket(&self, name: &str) -> Option<&BucketDefinition> {
        self.s3.buckets.iter().find(|bucket| bucket.name == name)
    }
}

impl Validate for BucketDefinition {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("S3.Buckets.Name", &self.name)?;
        if self.name.contains('/') {
            return Err(ImageSourceError::InvalidConfigValueError {
                field: "S3.Buckets.Name".to_string(),
                value: self.name.clone(),
                reason: "Bucket name cannot contain '/'".to_string(),
            });
        }

        if self.local_mirror_enabled {
            validation::validate_path("S3.Buckets.LocalDir", &self.local_mirror_dir)?;
        } else {
            validation::validate_s3_bucket_name("S3.Buckets.Dist", &self.remote_bucket_id)?;
            validation::validate_aws_region("S3.Buckets.Region", &self.region)?;
        }

        if let Some(endpoint) = self.endpoint() {
            if endpoint.contains("://") {
                validation::validate_url("S3.Buckets.EndPoint", endpoint)?;
            }
        }

        Ok(())
    }
}

impl Validate for SourceConfiguration {
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for bucket in self.buckets() {
            bucket.validate()?;
            if !seen.insert(bucket.name.as_str()) {
                tracing::warn!(
                    "Duplicate bucket name '{}', only the first definition is used",
                    bucket.name
                );
            }
        }
        Ok(())
    }
}

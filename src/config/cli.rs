use crate::config::SourceConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "s3-image-source")]
#[command(about = "Fetch an image from configured S3 buckets or their local mirrors")]
pub struct CliConfig {
    /// Path to the bucket definitions (TOML)
    #[arg(short, long, default_value = "s3-buckets.toml")]
    pub config: PathBuf,

    /// Image to fetch, as <bucket>/<key>
    #[arg(short, long, required_unless_present = "check")]
    pub query: Option<String>,

    /// Write the image here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep going with zero buckets when the config cannot be loaded
    #[arg(long)]
    pub allow_degraded: bool,

    /// Only load and validate the config, then list bucket names
    #[arg(long)]
    pub check: bool,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn source_config(&self) -> SourceConfig {
        SourceConfig::new(self.config.clone())
    }
}

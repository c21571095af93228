use anyhow::Context;
use clap::Parser;
use s3_image_source::utils::error::ErrorCategory;
use s3_image_source::utils::logger;
use s3_image_source::{
    CliConfig, ImageRequest, ImageSourceRegistry, S3ImageSource, S3_QUERY_KEY,
};
use std::io::Write;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("📁 Loading bucket definitions from: {}", args.config.display());

    let source_config = args.source_config();
    let source = if args.allow_degraded {
        S3ImageSource::new_degraded(&source_config)
    } else {
        match S3ImageSource::new(&source_config) {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("❌ Configuration load failed: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(1);
            }
        }
    };

    if args.check {
        for bucket in source.configuration().buckets() {
            let target = if bucket.local_mirror_enabled {
                format!("local:{}", bucket.local_mirror_dir)
            } else {
                format!("s3://{}/{}", bucket.remote_bucket_id, bucket.key_prefix.trim_matches('/'))
            };
            println!("{}\t{}", bucket.name, target);
        }
        if source.is_degraded() {
            tracing::warn!("⚠️ Configuration loaded in degraded mode, see errors above");
            eprintln!("❌ {} is not valid", args.config.display());
            std::process::exit(1);
        }
        tracing::info!("✅ Configuration is valid");
        return Ok(());
    }

    let mut registry = ImageSourceRegistry::new();
    registry.register(Box::new(source))?;

    let query = args.query.clone().unwrap_or_default();
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(S3_QUERY_KEY, &query)
        .finish();
    let uri = format!("/?{}", encoded)
        .parse()
        .with_context(|| format!("'{}' cannot be used as an image path", query))?;
    let request = ImageRequest::get(uri);

    // Ctrl-C 時取消正在進行的下載
    let cancellation = request.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancellation.cancel();
        }
    });

    match registry.get_image(&request).await {
        Ok(bytes) => {
            match &args.output {
                Some(path) => {
                    tokio::fs::write(path, &bytes)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!("✅ Saved {} bytes to {}", bytes.len(), path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&bytes).context("failed to write to stdout")?;
                    stdout.flush()?;
                }
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Fetch failed: {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.category() {
                ErrorCategory::Configuration => 1,
                ErrorCategory::Request => 2,
                ErrorCategory::Storage => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

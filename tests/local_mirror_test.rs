use httpmock::prelude::*;
use s3_image_source::{ImageRequest, ImageSource, ImageSourceError, S3ImageSource, SourceConfiguration};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn mirror_source(local_dir: &str, endpoint: &str) -> S3ImageSource {
    let config = SourceConfiguration::from_toml_str(&format!(
        r#"
[[S3.Buckets]]
Name = "b1"
Dist = "images-prod"
EndPoint = "{endpoint}"
AppId = "test"
AppKey = "test"
Region = "us-east-1"
EnableLocal = true
LocalDir = "{local_dir}/"
"#
    ))
    .unwrap();
    S3ImageSource::from_configuration(config)
}

fn request(query: &str) -> ImageRequest {
    ImageRequest::get(format!("/?s3={}", query).parse().unwrap())
}

#[tokio::test]
async fn test_local_mirror_returns_exact_bytes_without_remote_call() {
    let temp_dir = TempDir::new().unwrap();
    let content = b"\x89PNG\r\n\x1a\n not really a png \x00\xff".to_vec();
    std::fs::create_dir_all(temp_dir.path().join("nested")).unwrap();
    std::fs::write(temp_dir.path().join("nested/img.png"), &content).unwrap();

    let server = MockServer::start_async().await;
    let remote = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).body("remote");
        })
        .await;

    let local_dir = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let source = mirror_source(&local_dir, &server.base_url());

    let req = request("b1/nested/img.png");
    assert!(source.matches(&req));
    let data = source.get_image(&req).await.unwrap();

    assert_eq!(data, content);
    remote.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_leading_slash_in_key_is_trimmed() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("img.png"), b"abc").unwrap();

    let local_dir = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let source = mirror_source(&local_dir, "http://127.0.0.1:1");

    let data = source.get_image(&request("b1//img.png")).await.unwrap();
    assert_eq!(data, b"abc");
}

#[tokio::test]
async fn test_empty_mirror_file_is_an_empty_image() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("empty.png"), b"").unwrap();

    let local_dir = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let source = mirror_source(&local_dir, "http://127.0.0.1:1");

    let data = source.get_image(&request("b1/empty.png")).await.unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn test_missing_mirror_file_fails_without_fallback() {
    let temp_dir = TempDir::new().unwrap();

    let server = MockServer::start_async().await;
    let remote = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).body("remote");
        })
        .await;

    let local_dir = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let source = mirror_source(&local_dir, &server.base_url());

    let err = source.get_image(&request("b1/missing.png")).await.unwrap_err();
    match err {
        ImageSourceError::LocalReadError { path, .. } => {
            assert!(path.to_string_lossy().ends_with("/missing.png"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    remote.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_parent_segments_never_reach_filesystem() {
    let temp_dir = TempDir::new().unwrap();
    let local_dir = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let source = mirror_source(&local_dir, "http://127.0.0.1:1");

    let err = source
        .get_image(&request("b1/../secret.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, ImageSourceError::InvalidKey { .. }));
}

#[tokio::test]
async fn test_cancelled_request() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("img.png"), b"abc").unwrap();

    let local_dir = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let source = mirror_source(&local_dir, "http://127.0.0.1:1");

    let token = CancellationToken::new();
    token.cancel();
    let req = request("b1/img.png").with_cancellation(token);

    let err = source.get_image(&req).await.unwrap_err();
    assert!(matches!(err, ImageSourceError::Cancelled));
}

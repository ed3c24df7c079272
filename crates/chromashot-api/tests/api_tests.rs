//! HTTP-level tests for the upload → convert → serve-once flow.
//!
//! The external binaries are replaced by in-process tools so the tests run
//! without `ffmpeg` or the frame extractor installed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use chromashot_api::{create_router, ApiConfig, AppState};
use chromashot_media::{
    ConversionPipeline, ExternalTool, MediaError, MediaResult, ToolCommand, ToolRunner,
};
use chromashot_storage::ArtifactStore;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const BOUNDARY: &str = "chromashot-test-boundary";

/// In-process stand-in for an external conversion tool.
#[derive(Clone, Copy)]
enum FakeTool {
    /// Writes a tiny PPM frame.
    WriteFrame,
    /// Writes a PNG.
    WritePng,
    /// Leaves a partial file behind, then exits non-zero.
    PartialThenFail,
    /// Exits zero without producing anything.
    NoOutput,
    /// Runs a real process that outlives a short timeout.
    Hang,
}

#[async_trait]
impl ExternalTool for FakeTool {
    fn program(&self) -> &str {
        "fake"
    }

    async fn invoke(&self, input: &Path, output: &Path) -> MediaResult<()> {
        assert!(input.exists(), "tool input missing: {}", input.display());
        match self {
            FakeTool::WriteFrame => {
                tokio::fs::write(output, b"P6\n1 1\n255\n\x10\x20\x30").await?;
                Ok(())
            }
            FakeTool::WritePng => {
                let mut png = PNG_MAGIC.to_vec();
                png.extend_from_slice(b"fake image data");
                tokio::fs::write(output, png).await?;
                Ok(())
            }
            FakeTool::PartialThenFail => {
                tokio::fs::write(output, b"P6\n").await?;
                Err(MediaError::tool_failed("fake", Some(1), None))
            }
            FakeTool::NoOutput => Ok(()),
            FakeTool::Hang => {
                ToolRunner::new()
                    .with_timeout(Duration::from_millis(200))
                    .run(&ToolCommand::new("sleep").arg("30"))
                    .await
            }
        }
    }
}

struct TestApp {
    _dir: TempDir,
    root: PathBuf,
    router: Router,
}

impl TestApp {
    async fn new(extract: FakeTool, encode: FakeTool) -> Self {
        Self::with_config(ApiConfig::default(), extract, encode).await
    }

    async fn with_config(config: ApiConfig, extract: FakeTool, encode: FakeTool) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("outputs");
        let store = ArtifactStore::open(&root).await.unwrap();
        let pipeline = ConversionPipeline::new(Arc::new(extract), Arc::new(encode));
        let state = AppState::with_parts(config, store, pipeline);

        Self {
            _dir: dir,
            root,
            router: create_router(state, None),
        }
    }

    async fn working() -> Self {
        Self::new(FakeTool::WriteFrame, FakeTool::WritePng).await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Files currently left in the output directory.
    fn artifacts(&self) -> Vec<String> {
        std::fs::read_dir(&self.root)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

fn multipart_upload(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: video/mp4\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn video_upload() -> Request<Body> {
    multipart_upload(&[("video", Some("clip.mp4"), b"\x00\x00\x00\x18ftypmp42")])
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Pull `/image/<id>.png` out of a rendered page.
fn image_path(html: &str) -> String {
    let start = html.find("/image/").expect("page links an image");
    let end = start + html[start..].find(".png").expect("link ends in .png") + ".png".len();
    html[start..end].to_string()
}

#[tokio::test]
async fn test_index_renders_upload_form() {
    let app = TestApp::working().await;

    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="video""#));
    assert!(html.contains(&chromashot_api::templates::current_year().to_string()));
    assert!(!html.contains("<img"));
}

#[tokio::test]
async fn test_upload_without_video_field_is_rejected() {
    let app = TestApp::working().await;

    let response = app
        .send(multipart_upload(&[("title", None, b"holiday")]))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("No video uploaded"));
    assert!(app.artifacts().is_empty());
}

#[tokio::test]
async fn test_upload_with_empty_file_part_is_rejected() {
    let app = TestApp::working().await;

    let response = app.send(multipart_upload(&[("video", Some(""), b"")])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("No video uploaded"));
}

#[tokio::test]
async fn test_non_multipart_upload_is_rejected() {
    let app = TestApp::working().await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("No video uploaded"));
}

#[tokio::test]
async fn test_upload_produces_single_serve_png() {
    let app = TestApp::working().await;

    let response = app.send(video_upload()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    let path = image_path(&html);
    assert!(html.contains(&format!(r#"<img src="{path}""#)));

    let id = path
        .strip_prefix("/image/")
        .and_then(|p| p.strip_suffix(".png"))
        .unwrap();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

    // Only the output survives the upload request.
    assert_eq!(app.artifacts(), vec![format!("{id}.png")]);

    let response = app.get(&path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);

    // Consumed: gone from disk and no longer fetchable.
    assert!(app.artifacts().is_empty());
    let response = app.get(&path).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Not found");
}

#[tokio::test]
async fn test_unfinished_download_still_consumes_image() {
    let app = TestApp::working().await;
    let html = body_text(app.send(video_upload()).await).await;
    let path = image_path(&html);

    let response = app.get(&path).await;
    assert_eq!(response.status(), StatusCode::OK);
    drop(response);

    assert!(app.artifacts().is_empty());
    assert_eq!(app.get(&path).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_image_is_not_found() {
    let app = TestApp::working().await;

    for uri in [
        "/image/does-not-exist.png",
        "/image/0123456789abcdef0123456789abcdef.png",
        "/image/0123456789abcdef0123456789abcdef",
        "/image/..%2F..%2Fetc%2Fpasswd.png",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_text(response).await, "Not found");
    }
}

#[tokio::test]
async fn test_extract_failure_cleans_up() {
    let app = TestApp::new(FakeTool::PartialThenFail, FakeTool::WritePng).await;

    let response = app.send(video_upload()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("extract"));
    assert!(app.artifacts().is_empty());
}

#[tokio::test]
async fn test_encode_failure_cleans_up() {
    let app = TestApp::new(FakeTool::WriteFrame, FakeTool::PartialThenFail).await;

    let response = app.send(video_upload()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("encode"));
    assert!(app.artifacts().is_empty());
}

#[tokio::test]
async fn test_production_hides_conversion_details() {
    let config = ApiConfig {
        environment: "production".to_string(),
        ..ApiConfig::default()
    };
    let app = TestApp::with_config(config, FakeTool::PartialThenFail, FakeTool::WritePng).await;

    let response = app.send(video_upload()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "An internal error occurred");
    assert!(app.artifacts().is_empty());

    let response = app.get("/image/does-not-exist.png").await;
    assert_eq!(body_text(response).await, "Not found");
}

#[tokio::test]
async fn test_encoder_without_output_is_a_failure() {
    let app = TestApp::new(FakeTool::WriteFrame, FakeTool::NoOutput).await;

    let response = app.send(video_upload()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.artifacts().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_extract_timeout_leaves_nothing_servable() {
    let app = TestApp::new(FakeTool::Hang, FakeTool::WritePng).await;

    let response = app.send(video_upload()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("timed out"));
    assert!(app.artifacts().is_empty());
}

#[tokio::test]
async fn test_concurrent_uploads_do_not_collide() {
    let app = TestApp::working().await;

    let (a, b) = tokio::join!(app.send(video_upload()), app.send(video_upload()));
    let (a, b) = (body_text(a).await, body_text(b).await);
    let (path_a, path_b) = (image_path(&a), image_path(&b));

    assert_ne!(path_a, path_b);
    assert_eq!(app.artifacts().len(), 2);
    assert_eq!(app.get(&path_a).await.status(), StatusCode::OK);
    assert_eq!(app.get(&path_b).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint_and_headers() {
    let app = TestApp::working().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers.contains_key("X-Content-Type-Options"));
    assert!(headers.contains_key("X-Frame-Options"));
    assert!(headers.contains_key("X-Request-ID"));

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_unresolvable_tools() {
    let app = TestApp::working().await;

    let response = app.get("/ready").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["storage"]["status"], "ok");
    assert_eq!(json["checks"]["extract_tool"]["status"], "error");
}

//! Integration tests for the visualization service.
//!
//! The interpreters are replaced by `sh` and the installed wrappers by small
//! shell scripts, so these tests run without Python or R.
//!
//! Run with: `cargo test --test server_integration`
#![cfg(unix)]

use std::{fs, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

use chartcraft::{
    execution::{Runner, RunnerSettings},
    server::{create_router, ServerState},
    Language, VisualizeClient, VisualizeError,
};

/// Wrapper that writes a fake artifact. Args: script, output dir, file name.
const RENDERING_WRAPPER: &str = "echo \"rendered $1\"\nprintf 'PNG' > \"$2/$3\"\n";
const FAILING_WRAPPER: &str = "echo partial\necho boom >&2\nexit 1\n";
const HANGING_WRAPPER: &str = "sleep 30\n";

struct TestService {
    _dir: TempDir,
    state: Arc<ServerState>,
    router: Router,
}

async fn service_with(wrapper: &str, timeout: Duration) -> TestService {
    let dir = TempDir::new().unwrap();
    let viz_dir = dir.path().join("visualizations");
    let runner = Runner::new(RunnerSettings {
        python_bin: "sh".into(),
        rscript_bin: "sh".into(),
        timeout,
        wrappers_dir: viz_dir.join(".wrappers"),
    });
    let state = ServerState::prepare(viz_dir, runner).await.unwrap();
    for lang in Language::ALL {
        fs::write(state.runner.wrapper_path(lang), wrapper).unwrap();
    }
    let router = create_router(state.clone());
    TestService { _dir: dir, state, router }
}

async fn rendering_service() -> TestService {
    service_with(RENDERING_WRAPPER, Duration::from_secs(10)).await
}

/// Helper to make a POST request with a raw body.
async fn post_raw(router: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!(null));

    (status, json)
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(router, uri, serde_json::to_string(&body).unwrap()).await
}

/// Helper to make a GET request, returning status, content type and raw body.
async fn get(router: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, body.to_vec())
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let svc = rendering_service().await;

    for body in [json!({}), json!({"code": "x"}), json!({"language": "python"}), json!({"code": 1, "language": "r"})] {
        let (status, json) = post(&svc.router, "/api/visualize", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Code and language are required");
    }

    let (status, json) = post_raw(&svc.router, "/api/visualize", "not json".into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Code and language are required");
}

#[tokio::test]
async fn test_unknown_language_is_rejected() {
    let svc = rendering_service().await;

    for language in [json!("julia"), json!("Python"), json!(null)] {
        let (status, json) =
            post(&svc.router, "/api/visualize", json!({"code": "x", "language": language})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Language must be either \"python\" or \"r\"");
    }
}

// =============================================================================
// Rendering
// =============================================================================

#[tokio::test]
async fn test_successful_run_returns_and_serves_artifact() {
    let svc = rendering_service().await;
    let code = "import matplotlib.pyplot as plt\nplt.plot([1, 2])";

    let (status, json) =
        post(&svc.router, "/api/visualize", json!({"code": code, "language": "python"})).await;
    assert_eq!(status, StatusCode::OK, "body: {}", json);
    assert_eq!(json["success"], true);
    assert_eq!(json["type"], "static");

    let viz_id = json["vizId"].as_str().unwrap();
    let url = json["visualizationUrl"].as_str().unwrap();
    assert_eq!(url, format!("/visualizations/{}/visualization.png", viz_id));

    let script = svc.state.visualizations_dir.join(viz_id).join("script.py");
    assert_eq!(fs::read_to_string(script).unwrap(), code);

    let (status, content_type, body) = get(&svc.router, url).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(body, b"PNG");
}

#[tokio::test]
async fn test_interactive_code_gets_html_artifact() {
    let svc = rendering_service().await;

    let (status, json) = post(
        &svc.router,
        "/api/visualize",
        json!({"code": "library(plotly)\nprint(plot_ly(x = 1:3))", "language": "r"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", json);
    assert_eq!(json["type"], "interactive");
    let url = json["visualizationUrl"].as_str().unwrap();
    assert!(url.ends_with("/visualization.html"));

    let viz_id = json["vizId"].as_str().unwrap();
    assert!(svc.state.visualizations_dir.join(viz_id).join("script.R").exists());
}

#[tokio::test]
async fn test_each_run_gets_its_own_directory() {
    let svc = rendering_service().await;
    let body = json!({"code": "plot(1)", "language": "r"});

    let (_, first) = post(&svc.router, "/api/visualize", body.clone()).await;
    let (_, second) = post(&svc.router, "/api/visualize", body).await;
    assert_ne!(first["vizId"], second["vizId"]);
    for reply in [&first, &second] {
        let id = uuid::Uuid::parse_str(reply["vizId"].as_str().unwrap()).unwrap();
        assert_eq!(id.get_version_num(), 4);
    }
}

#[tokio::test]
async fn test_failed_run_reports_captured_output() {
    let svc = service_with(FAILING_WRAPPER, Duration::from_secs(10)).await;

    let (status, json) =
        post(&svc.router, "/api/visualize", json!({"code": "raise SystemExit", "language": "python"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Execution output: partial"), "got: {}", error);
    assert!(error.contains("Error: boom"), "got: {}", error);
}

#[tokio::test]
async fn test_hung_run_is_killed_at_timeout() {
    let svc = service_with(HANGING_WRAPPER, Duration::from_secs(1)).await;

    let started = std::time::Instant::now();
    let (status, json) =
        post(&svc.router, "/api/visualize", json!({"code": "while True: pass", "language": "python"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

// =============================================================================
// Artifacts & health
// =============================================================================

#[tokio::test]
async fn test_artifact_paths_are_restricted() {
    let svc = rendering_service().await;

    let (status, _, _) = get(&svc.router, "/visualizations/.wrappers/python_wrapper.py").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = "/visualizations/6f1c2f1e-5b7a-4d7e-9a53-0d0c6c2b8a11/visualization.png";
    let (status, _, _) = get(&svc.router, missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let dotfile = "/visualizations/6f1c2f1e-5b7a-4d7e-9a53-0d0c6c2b8a11/.hidden";
    let (status, _, _) = get(&svc.router, dotfile).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_artifacts_are_served_with_their_content_type() {
    let svc = rendering_service().await;
    let id = "0b7e4f9a-3c2d-4e1f-8a6b-5d4c3b2a1f0e";
    let dir = svc.state.visualizations_dir.join(id);
    fs::create_dir_all(&dir).unwrap();

    for (file, expected) in [
        ("visualization.jpg", "image/jpeg"),
        ("data.json", "application/json"),
        ("report.pdf", "application/pdf"),
        ("visualization.html", "text/html"),
    ] {
        fs::write(dir.join(file), b"artifact").unwrap();
        let (status, content_type, body) =
            get(&svc.router, &format!("/visualizations/{}/{}", id, file)).await;
        assert_eq!(status, StatusCode::OK, "{}", file);
        let content_type = content_type.unwrap_or_default();
        assert!(content_type.starts_with(expected), "{} served as {}", file, content_type);
        assert_eq!(body, b"artifact");
    }
}

#[tokio::test]
async fn test_health() {
    let svc = rendering_service().await;
    let (status, _, body) = get(&svc.router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

// =============================================================================
// Client against the real service
// =============================================================================

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_client_round_trip_through_service() {
    let svc = rendering_service().await;
    let origin = spawn(svc.router.clone()).await;
    let client = VisualizeClient::new(&origin, None).unwrap();

    let viz = client.visualize("plot(1:10)", Language::R).await.unwrap();
    assert!(viz.url.starts_with(&format!("{}/visualizations/", origin)));

    let bytes = reqwest::get(&viz.url).await.unwrap().bytes().await.unwrap();
    assert_eq!(&bytes[..], b"PNG");
}

#[tokio::test]
async fn test_client_sees_service_failure_message() {
    let svc = service_with(FAILING_WRAPPER, Duration::from_secs(10)).await;
    let origin = spawn(svc.router.clone()).await;
    let client = VisualizeClient::new(&origin, None).unwrap();

    match client.visualize("stop('no')", Language::R).await {
        Err(VisualizeError::Server(message)) => assert!(message.contains("boom")),
        other => panic!("expected server error, got {:?}", other),
    }
}

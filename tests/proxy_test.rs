use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use http_body_util::BodyExt;
use image_studio::config::StudioConfig;
use image_studio::models::ProcessInfo;
use image_studio::{AppState, create_app};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

async fn serve_upstream() -> String {
    let upstream = Router::new()
        .route(
            "/bucket/photo.png",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "image/png")],
                    vec![0x89u8, b'P', b'N', b'G'],
                )
            }),
        )
        .route("/bucket/untyped", get(|| async { Body::from(vec![1u8, 2, 3]) }))
        .route(
            "/bucket/slow.png",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        )
        .route(
            "/bucket/missing.png",
            get(|| async { (StatusCode::FORBIDDEN, "AccessDenied") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    format!("http://{}", addr)
}

fn setup_state() -> AppState {
    let config = StudioConfig {
        proxy_timeout: Duration::from_millis(200),
        ..StudioConfig::default()
    };
    AppState::new(config, reqwest::Client::new())
}

fn register(state: &AppState, upstream: &str, object: &str, file_name: &str) -> String {
    state.processes.register(ProcessInfo {
        s3_url: format!("{}/bucket/{}", upstream, object),
        original_file_name: file_name.to_string(),
        method: "upscale".to_string(),
    })
}

async fn get_proxy(state: AppState, process_id: &str) -> axum::response::Response {
    create_app(state)
        .oneshot(
            Request::builder()
                .uri(format!("/api/image/proxy/{}", process_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_unknown_process_is_not_found() {
    let response = get_proxy(setup_state(), "does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_text(response).await, "Not found");
}

#[tokio::test]
async fn test_proxy_streams_image_with_headers() {
    let upstream = serve_upstream().await;
    let state = setup_state();
    let id = register(&state, &upstream, "photo.png", "my photo (1).png");

    let response = get_proxy(state, &id).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=31536000");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename*=UTF-8''my%20photo%20(1).png"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_EXPOSE_HEADERS],
        "Content-Disposition"
    );
    assert!(headers.contains_key("x-request-id"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_cross_origin_request_keeps_expose_header() {
    let upstream = serve_upstream().await;
    let state = setup_state();
    let id = register(&state, &upstream, "photo.png", "photo.png");

    let response = create_app(state)
        .oneshot(
            Request::builder()
                .uri(format!("/api/image/proxy/{}", id))
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    let exposed: Vec<_> = headers
        .get_all(header::ACCESS_CONTROL_EXPOSE_HEADERS)
        .iter()
        .collect();
    assert_eq!(exposed, vec!["Content-Disposition"]);
}

#[tokio::test]
async fn test_missing_upstream_content_type_defaults_to_jpeg() {
    let upstream = serve_upstream().await;
    let state = setup_state();
    let id = register(&state, &upstream, "untyped", "raw.jpg");

    let response = get_proxy(state, &id).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let upstream = serve_upstream().await;
    let state = setup_state();
    let id = register(&state, &upstream, "slow.png", "slow.png");

    let response = get_proxy(state, &id).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_text(response).await, "Timeout fetching image");
}

#[tokio::test]
async fn test_upstream_error_is_internal_error() {
    let upstream = serve_upstream().await;
    let state = setup_state();
    let id = register(&state, &upstream, "missing.png", "missing.png");

    let response = get_proxy(state, &id).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Error fetching image");
}

#[tokio::test]
async fn test_health_reports_registered_processes() {
    let state = setup_state();
    register(&state, "http://storage.local", "a.png", "a.png");

    let response = create_app(state)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["processes"], 1);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

use crate::AppState;
use crate::api::error::AppError;
use crate::services::presign::encode_file_name;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use tracing::{error, info};

const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

#[utoipa::path(
    get,
    path = "/api/image/proxy/{process_id}",
    params(
        ("process_id" = String, Path, description = "Process ID")
    ),
    responses(
        (status = 200, description = "Image bytes fetched from object storage"),
        (status = 404, description = "Unknown process ID"),
        (status = 504, description = "Object storage did not answer in time"),
        (status = 500, description = "Fetching the image failed")
    ),
    tag = "images"
)]
pub async fn proxy_image(
    State(state): State<AppState>,
    Path(process_id): Path<String>,
) -> Result<Response, AppError> {
    info!("🔍 Fetching process info for ID: {}", process_id);

    let process = state.processes.get(&process_id).ok_or_else(|| {
        error!("❌ Process ID {} not found in store", process_id);
        AppError::NotFound("Not found".to_string())
    })?;

    let timeout = state.config.proxy_timeout;
    let fetch_failed = |e: reqwest::Error| {
        if e.is_timeout() {
            error!(
                "🚨 Storage fetch timed out after {:?} for: {}",
                timeout, process.original_file_name
            );
            AppError::GatewayTimeout("Timeout fetching image".to_string())
        } else {
            AppError::Upstream(format!(
                "fetching {} failed: {}",
                process.original_file_name, e
            ))
        }
    };

    info!("📥 Fetching image from storage: {}", process.original_file_name);
    let upstream = state
        .http
        .get(&process.s3_url)
        .timeout(timeout)
        .send()
        .await
        .map_err(fetch_failed)?;

    if !upstream.status().is_success() {
        return Err(AppError::Upstream(format!(
            "Failed to fetch image: {}",
            upstream.status()
        )));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();
    let bytes = upstream.bytes().await.map_err(fetch_failed)?;

    info!(
        "✅ Successfully fetched image for: {}",
        process.original_file_name
    );

    let content_disposition = format!(
        "inline; filename*=UTF-8''{}",
        encode_file_name(&process.original_file_name)
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=31536000")
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .header(header::ACCESS_CONTROL_EXPOSE_HEADERS, "Content-Disposition")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build proxy response: {}", e)))
}

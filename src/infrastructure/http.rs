use crate::config::StudioConfig;
use crate::services::image_api::{HttpImageApi, ImageApi};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub fn setup_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub fn setup_image_api(
    client: reqwest::Client,
    config: &StudioConfig,
) -> Result<Arc<dyn ImageApi>> {
    info!(
        "☁️  Image API: {} (presign {:?}, upload {:?}, transform {:?})",
        config.api_base_url, config.presign_timeout, config.upload_timeout, config.transform_timeout
    );
    Ok(Arc::new(HttpImageApi::new(client, config)?))
}

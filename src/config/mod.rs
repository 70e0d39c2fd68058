use std::env;
use std::time::Duration;

/// Runtime configuration for the upload pipeline and the proxy server
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Base URL of the presign and transform endpoints (default: "http://127.0.0.1:3000")
    pub api_base_url: String,

    /// Timeout for a single presign request (default: 30s)
    pub presign_timeout: Duration,

    /// Timeout for a single object-storage upload (default: 120s)
    pub upload_timeout: Duration,

    /// Timeout for the batched transform request (default: 300s)
    pub transform_timeout: Duration,

    /// Timeout for fetching an upstream image in the proxy (default: 30s)
    pub proxy_timeout: Duration,

    /// Maximum staged file size in bytes (default: 10 MB)
    pub max_file_size: usize,

    /// Content types accepted for staging (default: image/jpeg, image/png)
    pub allowed_types: Vec<String>,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".to_string(),
            presign_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(120),
            transform_timeout: Duration::from_secs(300),
            proxy_timeout: Duration::from_secs(30),
            max_file_size: 10 * 1024 * 1024, // 10 MB
            allowed_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

fn secs_from_env(key: &str, fallback: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn list_from_env(key: &str, fallback: Vec<String>) -> Vec<String> {
    env::var(key)
        .ok()
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or(fallback)
}

impl StudioConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            api_base_url: env::var("IMAGE_API_BASE_URL").unwrap_or(default.api_base_url),

            presign_timeout: secs_from_env("PRESIGN_TIMEOUT_SECS", default.presign_timeout),
            upload_timeout: secs_from_env("UPLOAD_TIMEOUT_SECS", default.upload_timeout),
            transform_timeout: secs_from_env("TRANSFORM_TIMEOUT_SECS", default.transform_timeout),
            proxy_timeout: secs_from_env("PROXY_TIMEOUT_SECS", default.proxy_timeout),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_types: list_from_env("ALLOWED_TYPES", default.allowed_types),
            allowed_origins: list_from_env("ALLOWED_ORIGINS", default.allowed_origins),
        }
    }

    /// Create config for local development (short timeouts, localhost API)
    pub fn development() -> Self {
        Self {
            presign_timeout: Duration::from_secs(5),
            upload_timeout: Duration::from_secs(30),
            transform_timeout: Duration::from_secs(60),
            proxy_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }

    /// Same config pointed at another API host
    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }
}

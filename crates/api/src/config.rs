use std::path::PathBuf;

use labelpool_core::assignment::{CoordinatorConfig, DuplicatePolicy, DEFAULT_MAX_RETRIES};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for draining the database pool after the server stops
    /// accepting connections (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT validation configuration.
    pub jwt: JwtConfig,
    /// Reservation attempts per accept call (default: `8`).
    pub accept_max_retries: u32,
    /// Let one user hold several seats in the same job (default: `false`).
    pub allow_duplicate_assignments: bool,
    /// Where uploaded job images are stored.
    pub blob: BlobConfig,
}

/// Which [`labelpool_core::blob::BlobStore`] implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    Local,
    S3,
}

impl BlobBackend {
    /// Parse a `BLOB_BACKEND` value (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "s3" => Some(Self::S3),
            _ => None,
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub backend: BlobBackend,
    /// Directory for the local backend; also served at `/blobs`.
    pub local_dir: PathBuf,
    /// Prefix of every returned image URI.
    pub public_base_url: String,
    /// Bucket for the S3 backend.
    pub s3_bucket: Option<String>,
}

impl BlobConfig {
    /// | Env Var                | Default                           |
    /// |------------------------|-----------------------------------|
    /// | `BLOB_BACKEND`         | `local`                           |
    /// | `BLOB_LOCAL_DIR`       | `./data/blobs`                    |
    /// | `BLOB_PUBLIC_BASE_URL` | `http://localhost:{PORT}/blobs`, or `https://{bucket}.s3.amazonaws.com` for S3 |
    /// | `S3_BUCKET`            | required when backend is `s3`     |
    fn from_env(port: u16) -> Self {
        let backend = std::env::var("BLOB_BACKEND")
            .ok()
            .map(|v| BlobBackend::parse(&v).expect("BLOB_BACKEND must be 'local' or 's3'"))
            .unwrap_or(BlobBackend::Local);

        let local_dir = std::env::var("BLOB_LOCAL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/blobs"));

        let s3_bucket = std::env::var("S3_BUCKET").ok().filter(|b| !b.is_empty());
        if backend == BlobBackend::S3 {
            assert!(
                s3_bucket.is_some(),
                "S3_BUCKET must be set when BLOB_BACKEND=s3"
            );
        }

        let public_base_url = std::env::var("BLOB_PUBLIC_BASE_URL").unwrap_or_else(|_| {
            match (backend, &s3_bucket) {
                (BlobBackend::S3, Some(bucket)) => format!("https://{bucket}.s3.amazonaws.com"),
                _ => format!("http://localhost:{port}/blobs"),
            }
        });

        Self {
            backend,
            local_dir,
            public_base_url,
            s3_bucket,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                    |
    /// |-------------------------------|----------------------------|
    /// | `HOST`                        | `0.0.0.0`                  |
    /// | `PORT`                        | `3000`                     |
    /// | `CORS_ORIGINS`                | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                       |
    /// | `ACCEPT_MAX_RETRIES`          | `8`                        |
    /// | `ALLOW_DUPLICATE_ASSIGNMENTS` | `false`                    |
    ///
    /// See [`JwtConfig::from_env`] and [`BlobConfig`] for the rest.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let accept_max_retries: u32 = std::env::var("ACCEPT_MAX_RETRIES")
            .unwrap_or_else(|_| DEFAULT_MAX_RETRIES.to_string())
            .parse()
            .expect("ACCEPT_MAX_RETRIES must be a valid u32");

        let allow_duplicate_assignments = std::env::var("ALLOW_DUPLICATE_ASSIGNMENTS")
            .map(|v| parse_flag(&v).expect("ALLOW_DUPLICATE_ASSIGNMENTS must be a boolean"))
            .unwrap_or(false);

        let jwt = JwtConfig::from_env();
        let blob = BlobConfig::from_env(port);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            accept_max_retries,
            allow_duplicate_assignments,
            blob,
        }
    }

    /// Coordinator tunables derived from this configuration.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            max_retries: self.accept_max_retries,
            duplicate_policy: if self.allow_duplicate_assignments {
                DuplicatePolicy::Allow
            } else {
                DuplicatePolicy::Reject
            },
        }
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a boolean env value (`true/false`, `1/0`, `yes/no`, `on/off`).
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

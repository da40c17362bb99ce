use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Where uploaded document bytes live.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    S3 {
        bucket: String,
        endpoint: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
    },
    Filesystem {
        root: PathBuf,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage: StorageConfig,
    pub port: u16,
    pub rust_log: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            storage: storage_from_env()?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse::<i64>()
                .context("SESSION_TTL_HOURS must be an integer")?,
            cookie_secure: parse_flag(std::env::var("COOKIE_SECURE").ok().as_deref())?,
        })
    }
}

fn storage_from_env() -> Result<StorageConfig> {
    let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "s3".to_string());
    match backend.as_str() {
        "s3" => Ok(StorageConfig::S3 {
            bucket: require_env("S3_BUCKET")?,
            endpoint: require_env("S3_ENDPOINT")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
        }),
        "filesystem" => Ok(StorageConfig::Filesystem {
            root: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
        }),
        other => bail!("STORAGE_BACKEND must be 's3' or 'filesystem', got '{other}'"),
    }
}

fn parse_flag(value: Option<&str>) -> Result<bool> {
    match value.map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(other) => bail!("expected a boolean flag, got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

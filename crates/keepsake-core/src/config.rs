//! Configuration module
//!
//! Settings for the enrichment worker: database pool, polling cadence, staging
//! directory, external tool locations and timeouts, and the reverse geocoder.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Common constants
const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Enrichment worker configuration
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub log_format: String,
    // Pipeline cadence
    pub poll_interval_secs: u64,
    pub debounce_secs: u64,
    // Local staging root for remote buckets
    pub staging_dir: PathBuf,
    // External tools
    pub exiftool_path: String,
    pub ffmpeg_path: String,
    pub face_detect_path: String,
    pub probe_timeout_secs: u64,
    pub transcode_timeout_secs: u64,
    pub thumbnail_timeout_secs: u64,
    pub face_detect_timeout_secs: u64,
    pub thumbnail_max_width: u32,
    // Reverse geocoding
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_min_interval_ms: u64,
    pub geocoder_timeout_secs: u64,
    // Signed URL cache
    pub signed_url_cache_capacity: usize,
}

/// Application configuration (enrichment worker).
#[derive(Clone, Debug)]
pub struct Config(pub Box<WorkerConfig>);

impl Config {
    fn as_worker(&self) -> &WorkerConfig {
        &self.0
    }

    /// Load configuration from environment variables (and `.env` when present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        WorkerConfig::from_env().map(|c| Config(Box::new(c)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_worker().validate()
    }

    pub fn is_production(&self) -> bool {
        let env = self.as_worker().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn database_url(&self) -> &str {
        &self.as_worker().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_worker().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_worker().db_timeout_seconds
    }

    pub fn environment(&self) -> &str {
        &self.as_worker().environment
    }

    pub fn json_logs(&self) -> bool {
        self.as_worker().log_format.eq_ignore_ascii_case("json")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.as_worker().poll_interval_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.as_worker().debounce_secs)
    }

    pub fn staging_dir(&self) -> &PathBuf {
        &self.as_worker().staging_dir
    }

    pub fn exiftool_path(&self) -> &str {
        &self.as_worker().exiftool_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_worker().ffmpeg_path
    }

    pub fn face_detect_path(&self) -> &str {
        &self.as_worker().face_detect_path
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.as_worker().probe_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.as_worker().transcode_timeout_secs)
    }

    pub fn thumbnail_timeout(&self) -> Duration {
        Duration::from_secs(self.as_worker().thumbnail_timeout_secs)
    }

    pub fn face_detect_timeout(&self) -> Duration {
        Duration::from_secs(self.as_worker().face_detect_timeout_secs)
    }

    pub fn thumbnail_max_width(&self) -> u32 {
        self.as_worker().thumbnail_max_width
    }

    pub fn geocoder_url(&self) -> &str {
        &self.as_worker().geocoder_url
    }

    pub fn geocoder_user_agent(&self) -> &str {
        &self.as_worker().geocoder_user_agent
    }

    pub fn geocoder_min_interval(&self) -> Duration {
        Duration::from_millis(self.as_worker().geocoder_min_interval_ms)
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.as_worker().geocoder_timeout_secs)
    }

    pub fn signed_url_cache_capacity(&self) -> usize {
        self.as_worker().signed_url_cache_capacity
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const POLL_INTERVAL_SECS: u64 = 10;
        const DEBOUNCE_SECS: u64 = 30;
        const PROBE_TIMEOUT_SECS: u64 = 60;
        const TRANSCODE_TIMEOUT_SECS: u64 = 3600;
        const THUMBNAIL_TIMEOUT_SECS: u64 = 120;
        const FACE_DETECT_TIMEOUT_SECS: u64 = 300;
        const THUMBNAIL_MAX_WIDTH: u32 = 720;
        const GEOCODER_MIN_INTERVAL_MS: u64 = 1000;
        const GEOCODER_TIMEOUT_SECS: u64 = 30;
        const SIGNED_URL_CACHE_CAPACITY: usize = 1024;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        Ok(Self {
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            environment,
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            poll_interval_secs: env_or("PIPELINE_POLL_INTERVAL_SECS", POLL_INTERVAL_SECS),
            debounce_secs: env_or("PIPELINE_DEBOUNCE_SECS", DEBOUNCE_SECS),
            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("keepsake-staging")),
            exiftool_path: env::var("EXIFTOOL_PATH").unwrap_or_else(|_| "exiftool".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            face_detect_path: env::var("FACE_DETECT_PATH")
                .unwrap_or_else(|_| "keepsake-faces".to_string()),
            probe_timeout_secs: env_or("PROBE_TIMEOUT_SECS", PROBE_TIMEOUT_SECS),
            transcode_timeout_secs: env_or("TRANSCODE_TIMEOUT_SECS", TRANSCODE_TIMEOUT_SECS),
            thumbnail_timeout_secs: env_or("THUMBNAIL_TIMEOUT_SECS", THUMBNAIL_TIMEOUT_SECS),
            face_detect_timeout_secs: env_or("FACE_DETECT_TIMEOUT_SECS", FACE_DETECT_TIMEOUT_SECS),
            thumbnail_max_width: env_or("THUMBNAIL_MAX_WIDTH", THUMBNAIL_MAX_WIDTH),
            geocoder_url: env::var("GEOCODER_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| "keepsake-worker".to_string()),
            geocoder_min_interval_ms: env_or("GEOCODER_MIN_INTERVAL_MS", GEOCODER_MIN_INTERVAL_MS),
            geocoder_timeout_secs: env_or("GEOCODER_TIMEOUT_SECS", GEOCODER_TIMEOUT_SECS),
            signed_url_cache_capacity: env_or(
                "SIGNED_URL_CACHE_CAPACITY",
                SIGNED_URL_CACHE_CAPACITY,
            ),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.database_url.starts_with("postgresql://")
            || self.database_url.starts_with("postgres://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }

        if self.thumbnail_max_width == 0 {
            return Err(anyhow::anyhow!("THUMBNAIL_MAX_WIDTH must be greater than 0"));
        }

        if self.signed_url_cache_capacity == 0 {
            return Err(anyhow::anyhow!(
                "SIGNED_URL_CACHE_CAPACITY must be greater than 0"
            ));
        }

        if !self.geocoder_url.starts_with("http://") && !self.geocoder_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!("GEOCODER_URL must be an http(s) URL"));
        }

        Ok(())
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + ToString,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}

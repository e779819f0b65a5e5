//! Configuration module
//!
//! Process-wide settings read once at startup from the environment (and an
//! optional `.env` file). Nothing here changes after the server starts.

use std::env;
use std::path::PathBuf;

const SERVER_PORT: u16 = 3000;
const MAX_UPLOAD_SIZE_MB: usize = 50;
const COMPRESS_QUALITY_CEILING: u8 = 83;
const HTTP_CONCURRENCY_LIMIT: usize = 1024;
const UPLOAD_DIR: &str = "./uploads";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Directory holding uploaded files for the lifetime of one request
    pub upload_dir: PathBuf,
    pub max_upload_size_bytes: usize,
    /// Upper bound applied to any requested compression quality
    pub compress_quality_ceiling: u8,
    pub max_concurrent_transforms: usize,
    pub http_concurrency_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            upload_dir: PathBuf::from(UPLOAD_DIR),
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            compress_quality_ceiling: COMPRESS_QUALITY_CEILING,
            max_concurrent_transforms: default_transform_workers(),
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
        }
    }
}

fn default_transform_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a valid number"))?;

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(UPLOAD_DIR)),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            compress_quality_ceiling: env::var("COMPRESS_QUALITY_CEILING")
                .unwrap_or_else(|_| COMPRESS_QUALITY_CEILING.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("COMPRESS_QUALITY_CEILING must be a number"))?,
            max_concurrent_transforms: env::var("MAX_CONCURRENT_TRANSFORMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_transform_workers),
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if !(1..=100).contains(&self.compress_quality_ceiling) {
            return Err(anyhow::anyhow!(
                "COMPRESS_QUALITY_CEILING must be between 1 and 100"
            ));
        }

        if self.max_concurrent_transforms == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_TRANSFORMS must be greater than 0"
            ));
        }

        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be greater than 0"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }

    pub fn max_upload_size_mb(&self) -> usize {
        self.max_upload_size_bytes / 1024 / 1024
    }
}

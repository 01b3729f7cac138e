use crate::error::{AppError, Result};

pub const API_URL: &str = "http://localhost:3000";

/// Page size shared by the query endpoint and the polling client.
/// `total_pages` is derived from it, so both sides must agree.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Upper bound accepted from `page_size` query params; larger values are clamped.
pub const MAX_PAGE_SIZE: u32 = 5_000;

/// Main query re-poll interval (seconds).
pub const PAGE_POLL_INTERVAL_SECS: u64 = 5;

/// Account list re-poll interval (seconds). Independent of the main query.
pub const ACCOUNTS_POLL_INTERVAL_SECS: u64 = 10;

/// Per-request timeout for the polling client. A timeout surfaces as a failed query.
pub const HTTP_TIMEOUT_SECS: u64 = 5;

/// Channel capacity for poll responses flowing back into the view state.
pub const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Pending inserts buffered ahead of the writer (WRITE_QUEUE_CAPACITY)
    pub write_queue_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "banners.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            write_queue_capacity: std::env::var("WRITE_QUEUE_CAPACITY")
                .unwrap_or_else(|_| CHANNEL_CAPACITY.to_string())
                .parse::<usize>()
                .unwrap_or(CHANNEL_CAPACITY)
                .max(1),
        })
    }
}

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Display board refresh cadence in milliseconds. The board also refreshes
    /// on change signals; the timer is the authoritative fallback.
    pub board_refresh_ms: u64,
    /// How long a served ticket stays on the "recently served" panel, seconds.
    pub served_window_secs: i64,
    /// How many waiting tickets the public panel previews as "next up".
    pub next_up_limit: usize,
    /// Row cap for report queries and CSV export.
    pub report_row_cap: usize,
    /// Fixed UTC offset (hours) used for report timestamps and the "today" cutoff.
    pub report_tz_offset_hours: i32,
    /// Whether the board watcher emits call announcements.
    pub announcements_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            board_refresh_ms: env::var("BOARD_REFRESH_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("BOARD_REFRESH_MS must be a valid number")?,
            served_window_secs: env::var("SERVED_WINDOW_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("SERVED_WINDOW_SECS must be a valid number")?,
            next_up_limit: env::var("NEXT_UP_LIMIT")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .context("NEXT_UP_LIMIT must be a valid number")?,
            report_row_cap: env::var("REPORT_ROW_CAP")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .context("REPORT_ROW_CAP must be a valid number")?,
            report_tz_offset_hours: env::var("REPORT_TZ_OFFSET_HOURS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .context("REPORT_TZ_OFFSET_HOURS must be a valid number")?,
            announcements_enabled: env::var("ANNOUNCEMENTS_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }
}

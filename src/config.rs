use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_BASE_URL: &str = "https://www.kinonh.pl/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/114.0.0.0 Safari/537.36";

/// Upper bound on in-flight requests against the theater site.
pub const MAX_WORKERS: usize = 8;

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub database_url: String,
    pub days_ahead: usize,
    pub max_concurrent: usize,
    pub request_timeout_secs: u64,
    pub requests_per_second: u32,
    pub user_agent: String,
    pub webhook_url: Option<String>,
    pub outbox_dir: PathBuf,
    pub recipients_file: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let base_url =
            std::env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movies.db?mode=rwc".to_string());

        let days_ahead: usize = std::env::var("DAYS_AHEAD")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DAYS_AHEAD")?;
        if days_ahead == 0 {
            anyhow::bail!("DAYS_AHEAD must be greater than zero");
        }

        let max_concurrent: usize = std::env::var("MAX_CONCURRENT_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(MAX_WORKERS)
            .clamp(1, MAX_WORKERS);

        let request_timeout_secs: u64 =
            std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(30);

        let requests_per_second: u32 =
            std::env::var("REQUESTS_PER_SECOND").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let user_agent =
            std::env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let webhook_url = std::env::var("NOTIFY_WEBHOOK_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let outbox_dir: PathBuf =
            std::env::var("OUTBOX_DIR").unwrap_or_else(|_| "outbox".to_string()).into();
        let recipients_file: PathBuf =
            std::env::var("RECIPIENTS_FILE").unwrap_or_else(|_| "emails.txt".to_string()).into();

        Ok(Self {
            base_url,
            database_url,
            days_ahead,
            max_concurrent,
            request_timeout_secs,
            requests_per_second,
            user_agent,
            webhook_url,
            outbox_dir,
            recipients_file,
        })
    }
}

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Published Box link for the registry spreadsheet. Overridable so a mirror
/// (or a test server) can be substituted without a rebuild.
pub const DEFAULT_SHARED_URL: &str = "https://app.box.com/s/07rbc57mlzd1az6y7sbx6blgmclhsl70";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TTL_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct Config {
    /// Shared-file reference the download candidates are derived from.
    pub shared_url: String,
    /// Optional direct-file URL; when set it is tried first, unmodified.
    pub direct_file_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let shared_url =
            env::var("BOX_SHARED_URL").unwrap_or_else(|_| DEFAULT_SHARED_URL.to_string());
        let direct_file_url = env::var("BOX_DIRECT_FILE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("parsing BIND_ADDR")?;

        let cache_ttl = match env::var("CACHE_TTL_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().context("parsing CACHE_TTL_SECS")?),
            Err(_) => Duration::from_secs(DEFAULT_TTL_SECS),
        };

        Ok(Config {
            shared_url,
            direct_file_url,
            bind_addr,
            cache_ttl,
        })
    }
}

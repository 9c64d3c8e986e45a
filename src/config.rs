use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Process-wide settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: Url,
    pub timeout: Duration,
    pub log_file: PathBuf,
}

impl Config {
    pub fn resolve(api_base: &str, timeout_secs: u64, log_file: Option<PathBuf>) -> Result<Self> {
        if timeout_secs == 0 {
            return Err(anyhow!("Request timeout must be at least one second"));
        }
        Ok(Self {
            api_base: parse_api_base(api_base)?,
            timeout: Duration::from_secs(timeout_secs),
            log_file: log_file.unwrap_or_else(default_log_path),
        })
    }
}

fn parse_api_base(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .with_context(|| format!("Invalid API base URL: '{}'", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!(
            "Unsupported API base URL scheme '{}' (expected http or https)",
            other
        )),
    }
}

fn default_log_path() -> PathBuf {
    // Use XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobfinder") {
        proj_dirs.data_dir().join("jobfinder.log")
    } else {
        PathBuf::from("jobfinder.log")
    }
}

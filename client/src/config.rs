//! Configuration management for the portal client.

use std::env;
use std::path::PathBuf;

use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:8003";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without trailing slash
    pub api_base_url: String,
    /// Results per page on the keyword search view
    pub page_size: u32,
    /// Rows per page on the admin reports view
    pub reports_page_size: u32,
    /// Minimum characters per keyword
    pub min_keyword_len: usize,
    /// Parallel requests allowed when collecting every user's reports
    pub report_fetch_concurrency: usize,
    /// Session file override
    pub session_file: Option<PathBuf>,
    /// Where downloaded reports are written
    pub download_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 4,
            reports_page_size: 10,
            min_keyword_len: 3,
            report_fetch_concurrency: 1,
            session_file: None,
            download_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("PORTAL_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        Ok(Self {
            api_base_url,
            page_size: positive(&lookup, "PORTAL_PAGE_SIZE", defaults.page_size)?,
            reports_page_size: positive(
                &lookup,
                "PORTAL_REPORTS_PAGE_SIZE",
                defaults.reports_page_size,
            )?,
            min_keyword_len: parsed(&lookup, "PORTAL_MIN_KEYWORD_LEN", defaults.min_keyword_len)?,
            report_fetch_concurrency: positive(
                &lookup,
                "PORTAL_REPORT_FETCH_CONCURRENCY",
                defaults.report_fetch_concurrency,
            )?,
            session_file: lookup("PORTAL_SESSION_FILE").map(PathBuf::from),
            download_dir: lookup("PORTAL_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
        })
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", key, raw))),
        None => Ok(default),
    }
}

fn positive<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + Default,
{
    let value = parsed(lookup, key, default)?;
    if value == T::default() {
        return Err(Error::Config(format!("{} must be greater than zero", key)));
    }
    Ok(value)
}

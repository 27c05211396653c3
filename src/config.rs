use crate::error::{AppError, Result};
use crate::screener::Criteria;
use crate::types::{CategoryFilter, ChangeFilter, SortDirection, SortField};

pub const API_URL: &str = "http://localhost:8000/api/";
pub const PAIRS_PATH: &str = "trading-pairs/";

/// HTTP timeout for the single trading-pairs request (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Category choices offered by the interactive category toggle, after "all".
pub const CATEGORY_CHOICES: &[&str] = &["linear", "inverse", "spot"];

/// Volume at which the TUI volume gauge is full (USD).
pub const VOLUME_GAUGE_FULL: f64 = 100_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub pairs_path: String,
    pub request_timeout_secs: u64,
    pub log_level: String,
    /// TUI log destination (LOG_FILE). The headless binary logs to stderr.
    pub log_file: String,
    pub output: OutputFormat,
    /// Starting criteria (SEARCH, CATEGORY, CHANGE, MIN_PRICE, MIN_VOLUME, SORT_FIELD, SORT_DIR)
    pub criteria: Criteria,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let output = match var("OUTPUT").as_deref() {
            None | Some("table") => OutputFormat::Table,
            Some("json") => OutputFormat::Json,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "OUTPUT must be 'table' or 'json', got '{other}'"
                )))
            }
        };

        let mut criteria = Criteria::default();
        if let Some(search) = var("SEARCH") {
            criteria.search_text = search;
        }
        if let Some(category) = var("CATEGORY") {
            criteria.category_filter = CategoryFilter::from_tag(&category);
        }
        if let Some(change) = var("CHANGE") {
            criteria.change_filter = change.parse::<ChangeFilter>()?;
        }
        criteria.min_price = parse_bound("MIN_PRICE", var("MIN_PRICE"))?;
        criteria.min_volume = parse_bound("MIN_VOLUME", var("MIN_VOLUME"))?;
        if let Some(field) = var("SORT_FIELD") {
            criteria.sort_field = field.parse::<SortField>()?;
        }
        if let Some(dir) = var("SORT_DIR") {
            criteria.sort_direction = dir.parse::<SortDirection>()?;
        }

        Ok(Self {
            api_url: var("API_URL").unwrap_or_else(|| API_URL.to_string()),
            pairs_path: var("PAIRS_PATH").unwrap_or_else(|| PAIRS_PATH.to_string()),
            request_timeout_secs: var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| REQUEST_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|_| {
                    AppError::Config("REQUEST_TIMEOUT_SECS must be a whole number".to_string())
                })?,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_file: var("LOG_FILE").unwrap_or_else(|| "screener.log".to_string()),
            output,
            criteria,
        })
    }

    /// Full URL of the trading-pairs endpoint.
    pub fn pairs_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.pairs_path.trim_start_matches('/')
        )
    }
}

fn parse_bound(key: &str, raw: Option<String>) -> Result<Option<f64>> {
    match raw {
        None => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| AppError::Config(format!("{key} must be a number, got '{s}'"))),
    }
}

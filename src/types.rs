use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// TradingPair
// ---------------------------------------------------------------------------

/// One row of the trading-pairs endpoint. Numeric columns stay as the text the
/// server sent; callers parse them on demand with [`parse_numeric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingPair {
    pub id: i64,
    pub symbol: String,
    pub category: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_price: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub volume_24h: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub funding_rate: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub price_change_percent_24h: String,
}

impl TradingPair {
    pub fn last_price(&self) -> Option<f64> {
        parse_numeric(&self.last_price)
    }

    pub fn volume_24h(&self) -> Option<f64> {
        parse_numeric(&self.volume_24h)
    }

    pub fn funding_rate(&self) -> Option<f64> {
        parse_numeric(&self.funding_rate)
    }

    pub fn price_change_percent_24h(&self) -> Option<f64> {
        parse_numeric(&self.price_change_percent_24h)
    }

    /// Parsed value of the column a [`SortField`] names.
    pub fn numeric(&self, field: SortField) -> Option<f64> {
        match field {
            SortField::PriceChangePercent24h => self.price_change_percent_24h(),
            SortField::Volume24h => self.volume_24h(),
            SortField::LastPrice => self.last_price(),
            SortField::FundingRate => self.funding_rate(),
        }
    }

    pub fn category_kind(&self) -> CategoryKind {
        CategoryKind::from_tag(&self.category)
    }
}

/// Parse a numeric column. Empty, non-numeric and non-finite text ("NaN",
/// "inf") all yield `None`. `-0` comes back as `0.0`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| if v == 0.0 { 0.0 } else { v })
}

/// Accepts a JSON string, number or null for a text column.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Display grouping for the open-ended category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Linear,
    Inverse,
    Spot,
    Other,
}

impl CategoryKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "linear" => CategoryKind::Linear,
            "inverse" => CategoryKind::Inverse,
            "spot" => CategoryKind::Spot,
            _ => CategoryKind::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Criteria enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[serde(rename = "price_change_percent_24h")]
    PriceChangePercent24h,
    #[serde(rename = "volume_24h")]
    Volume24h,
    LastPrice,
    FundingRate,
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SortField::PriceChangePercent24h => "price_change_percent_24h",
            SortField::Volume24h => "volume_24h",
            SortField::LastPrice => "last_price",
            SortField::FundingRate => "funding_rate",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price_change_percent_24h" | "change" => Ok(SortField::PriceChangePercent24h),
            "volume_24h" | "volume" => Ok(SortField::Volume24h),
            "last_price" | "price" => Ok(SortField::LastPrice),
            "funding_rate" | "funding" => Ok(SortField::FundingRate),
            other => Err(AppError::Config(format!("unknown sort field '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AppError::Config(format!("unknown sort direction '{other}'"))),
        }
    }
}

/// Partition on the sign of the 24h change. Zero counts as positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFilter {
    All,
    Positive,
    Negative,
}

impl ChangeFilter {
    /// all → positive → negative → all
    pub fn next(self) -> Self {
        match self {
            ChangeFilter::All => ChangeFilter::Positive,
            ChangeFilter::Positive => ChangeFilter::Negative,
            ChangeFilter::Negative => ChangeFilter::All,
        }
    }
}

impl std::fmt::Display for ChangeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeFilter::All => "all",
            ChangeFilter::Positive => "positive",
            ChangeFilter::Negative => "negative",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ChangeFilter {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ChangeFilter::All),
            "positive" => Ok(ChangeFilter::Positive),
            "negative" => Ok(ChangeFilter::Negative),
            other => Err(AppError::Config(format!("unknown change filter '{other}'"))),
        }
    }
}

/// `All` or an exact, case-sensitive category tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Exact(String),
}

impl CategoryFilter {
    pub fn from_tag(tag: &str) -> Self {
        if tag == "all" {
            CategoryFilter::All
        } else {
            CategoryFilter::Exact(tag.to_string())
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Exact(tag) => tag == category,
        }
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Exact(tag) => write!(f, "{tag}"),
        }
    }
}

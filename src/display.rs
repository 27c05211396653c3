//! Text formatting shared by the table printer and the TUI.

use crate::types::{SortDirection, SortField, TradingPair};

pub const PLACEHOLDER: &str = "--";

pub fn format_price(pair: &TradingPair) -> String {
    pair.last_price()
        .map_or(PLACEHOLDER.to_string(), |v| format!("{v:.4}"))
}

pub fn format_change(pair: &TradingPair) -> String {
    pair.price_change_percent_24h()
        .map_or(PLACEHOLDER.to_string(), |v| format!("{v:.2}%"))
}

/// Whole dollars with thousands separators, e.g. `$500,000,000`.
pub fn format_volume(pair: &TradingPair) -> String {
    match pair.volume_24h() {
        Some(v) => {
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{sign}${}", group_thousands(v.abs().round() as u64))
        }
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_funding(pair: &TradingPair) -> String {
    pair.funding_rate()
        .map_or(PLACEHOLDER.to_string(), |v| format!("{v:.6}"))
}

/// `linear` → `Linear`. Unknown tags are shown as sent.
pub fn category_label(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Other".to_string(),
    }
}

/// `None` when the value is absent, otherwise whether it reads as an up move.
/// Zero is up.
pub fn is_up(value: Option<f64>) -> Option<bool> {
    value.map(|v| v >= 0.0)
}

pub fn trend_arrow(pair: &TradingPair) -> &'static str {
    match is_up(pair.price_change_percent_24h()) {
        Some(true) => "▲",
        Some(false) => "▼",
        None => " ",
    }
}

/// Column header with ▼/▲ on the active sort column.
pub fn header_label(title: &str, field: SortField, active: SortField, dir: SortDirection) -> String {
    if field != active {
        return title.to_string();
    }
    match dir {
        SortDirection::Desc => format!("{title} ▼"),
        SortDirection::Asc => format!("{title} ▲"),
    }
}

pub fn displayed_label(count: usize) -> String {
    match count {
        1 => "1 pair displayed".to_string(),
        n => format!("{n} pairs displayed"),
    }
}

/// Share of a gauge in `[0, 1]`: `value / full`, clamped.
pub fn gauge_ratio(value: Option<f64>, full: f64) -> f64 {
    match value {
        Some(v) if full > 0.0 => (v.abs() / full).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

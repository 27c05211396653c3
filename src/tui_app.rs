use crossterm::event::KeyCode;
use tracing::{info, warn};

use crate::config::CATEGORY_CHOICES;
use crate::error::{AppError, Result};
use crate::screener::{Criteria, Screener};
use crate::types::{CategoryFilter, SortField};

// ---------------------------------------------------------------------------
// Input mode
// ---------------------------------------------------------------------------

/// Which text field, if any, is capturing keystrokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Keystrokes edit the search text in place.
    Search,
    /// Buffer for the min-price bound, applied on Enter.
    MinPrice(String),
    /// Buffer for the min-volume bound, applied on Enter.
    MinVolume(String),
}

/// What the event loop must do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Reload,
    Quit,
}

/// Column order of the sort hotkeys `1`..`4`.
pub const SORT_KEYS: [(char, SortField); 4] = [
    ('1', SortField::LastPrice),
    ('2', SortField::PriceChangePercent24h),
    ('3', SortField::Volume24h),
    ('4', SortField::FundingRate),
];

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppState {
    pub screener: Screener,
    pub mode: InputMode,
    pub selected: Option<usize>,
    /// Last rejected bound input, shown in the footer until the next key.
    pub notice: Option<String>,
    pub source_url: String,
}

impl AppState {
    pub fn new(criteria: Criteria, source_url: String) -> Self {
        Self {
            screener: Screener::new(criteria),
            mode: InputMode::Normal,
            selected: None,
            notice: None,
            source_url,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> KeyOutcome {
        self.notice = None;
        let outcome = match self.mode.clone() {
            InputMode::Normal => self.handle_normal(code),
            InputMode::Search => {
                self.handle_search(code);
                KeyOutcome::Continue
            }
            InputMode::MinPrice(buf) => {
                if let Some(bound) = self.edit_bound(code, buf, InputMode::MinPrice) {
                    self.screener.set_min_price(bound);
                }
                KeyOutcome::Continue
            }
            InputMode::MinVolume(buf) => {
                if let Some(bound) = self.edit_bound(code, buf, InputMode::MinVolume) {
                    self.screener.set_min_volume(bound);
                }
                KeyOutcome::Continue
            }
        };
        self.clamp_selection();
        outcome
    }

    fn handle_normal(&mut self, code: KeyCode) -> KeyOutcome {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return KeyOutcome::Quit,
            KeyCode::Char('R') => return KeyOutcome::Reload,
            KeyCode::Char('/') => self.mode = InputMode::Search,
            KeyCode::Char('c') => {
                let next = next_category(&self.screener.criteria().category_filter);
                self.screener.set_category_filter(next);
            }
            KeyCode::Char('v') => {
                let next = self.screener.criteria().change_filter.next();
                self.screener.set_change_filter(next);
            }
            KeyCode::Char('p') => {
                let buf = bound_text(self.screener.criteria().min_price);
                self.mode = InputMode::MinPrice(buf);
            }
            KeyCode::Char('o') => {
                let buf = bound_text(self.screener.criteria().min_volume);
                self.mode = InputMode::MinVolume(buf);
            }
            KeyCode::Char('x') => {
                self.screener.reset();
                info!("Filters reset");
            }
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Char(c) => {
                if let Some((_, field)) = SORT_KEYS.iter().find(|(k, _)| *k == c) {
                    self.screener.activate_sort(*field);
                }
            }
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn handle_search(&mut self, code: KeyCode) {
        let mut text = self.screener.criteria().search_text.clone();
        match code {
            KeyCode::Enter | KeyCode::Esc => {
                self.mode = InputMode::Normal;
                return;
            }
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Char(c) => text.push(c),
            _ => return,
        }
        self.screener.set_search_text(text);
        self.selected = None;
    }

    /// Edit a bound buffer. Returns `Some(bound)` when Enter commits a valid
    /// value (`Some(None)` clears the bound).
    fn edit_bound(
        &mut self,
        code: KeyCode,
        mut buf: String,
        wrap: fn(String) -> InputMode,
    ) -> Option<Option<f64>> {
        match code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                None
            }
            KeyCode::Enter => {
                self.mode = InputMode::Normal;
                match parse_bound_input(&buf) {
                    Ok(bound) => Some(bound),
                    Err(e) => {
                        warn!("Rejected bound input: {e}");
                        self.notice = Some(e.to_string());
                        None
                    }
                }
            }
            KeyCode::Backspace => {
                buf.pop();
                self.mode = wrap(buf);
                None
            }
            KeyCode::Char(c) => {
                buf.push(c);
                self.mode = wrap(buf);
                None
            }
            _ => None,
        }
    }

    fn select_next(&mut self) {
        let max = self.screener.displayed_count().saturating_sub(1);
        let next = self.selected.map_or(0, |i| (i + 1).min(max));
        self.selected = Some(next);
    }

    fn select_prev(&mut self) {
        let prev = self.selected.map_or(0, |i| i.saturating_sub(1));
        self.selected = Some(prev);
    }

    /// Keep the selection inside the current view.
    pub fn clamp_selection(&mut self) {
        let count = self.screener.displayed_count();
        self.selected = match self.selected {
            _ if count == 0 => None,
            Some(i) => Some(i.min(count - 1)),
            None => None,
        };
    }
}

/// all → linear → inverse → spot → all. A tag outside the list goes back to all.
pub fn next_category(current: &CategoryFilter) -> CategoryFilter {
    match current {
        CategoryFilter::All => CategoryFilter::from_tag(CATEGORY_CHOICES[0]),
        CategoryFilter::Exact(tag) => CATEGORY_CHOICES
            .iter()
            .position(|c| *c == tag.as_str())
            .and_then(|i| CATEGORY_CHOICES.get(i + 1))
            .map_or(CategoryFilter::All, |next| CategoryFilter::from_tag(next)),
    }
}

/// Empty input clears the bound; anything else must be a finite number.
pub fn parse_bound_input(raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| AppError::Config(format!("'{raw}' is not a number")))
}

fn bound_text(bound: Option<f64>) -> String {
    bound.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::PairSource;
    use crate::types::{ChangeFilter, SortDirection, TradingPair};

    struct Fixed;

    impl PairSource for Fixed {
        async fn fetch_pairs(&self) -> Result<Vec<TradingPair>> {
            Ok(serde_json::from_str(
                r#"[
                {"id":1,"symbol":"BTCUSDT","category":"linear","last_price":"65000.1234","volume_24h":"500000000","funding_rate":"0.000100","price_change_percent_24h":"2.50"},
                {"id":2,"symbol":"ETHUSDT","category":"spot","last_price":"3000.50","volume_24h":"200000000","funding_rate":"-0.000050","price_change_percent_24h":"-1.20"}
            ]"#,
            )?)
        }
    }

    async fn loaded_app() -> AppState {
        let mut app = AppState::new(Criteria::default(), "http://test".to_string());
        app.screener.load(&Fixed).await;
        app
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn search_mode_captures_keys() {
        let mut app = loaded_app().await;
        app.handle_key(KeyCode::Char('/'));
        assert_eq!(app.mode, InputMode::Search);

        // 'q' is text here, not quit
        type_text(&mut app, "eqth");
        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Backspace);
        type_text(&mut app, "th");
        assert_eq!(app.screener.criteria().search_text, "eth");
        assert_eq!(app.screener.displayed_count(), 1);

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(app.handle_key(KeyCode::Char('q')), KeyOutcome::Quit);
    }

    #[tokio::test]
    async fn min_volume_entry_commits_on_enter() {
        let mut app = loaded_app().await;
        app.handle_key(KeyCode::Char('o'));
        type_text(&mut app, "300000000");
        assert_eq!(app.screener.criteria().min_volume, None);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screener.criteria().min_volume, Some(300_000_000.0));
        assert_eq!(app.screener.displayed_count(), 1);

        // Empty input clears the bound
        app.handle_key(KeyCode::Char('o'));
        for _ in 0..9 {
            app.handle_key(KeyCode::Backspace);
        }
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screener.criteria().min_volume, None);
    }

    #[tokio::test]
    async fn bad_bound_input_keeps_previous_bound() {
        let mut app = loaded_app().await;
        app.handle_key(KeyCode::Char('p'));
        type_text(&mut app, "10x");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screener.criteria().min_price, None);
        assert!(app.notice.is_some());
        assert_eq!(app.mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn toggles_cycle_and_reset() {
        let mut app = loaded_app().await;
        app.handle_key(KeyCode::Char('v'));
        app.handle_key(KeyCode::Char('v'));
        assert_eq!(app.screener.criteria().change_filter, ChangeFilter::Negative);

        app.handle_key(KeyCode::Char('3'));
        app.handle_key(KeyCode::Char('3'));
        assert_eq!(app.screener.criteria().sort_field, SortField::Volume24h);
        assert_eq!(app.screener.criteria().sort_direction, SortDirection::Asc);

        app.handle_key(KeyCode::Char('x'));
        assert!(app.screener.criteria().is_default());
    }

    #[tokio::test]
    async fn selection_stays_inside_view() {
        let mut app = loaded_app().await;
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Char('j'));
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(app.selected, Some(1));

        app.handle_key(KeyCode::Char('v'));
        app.handle_key(KeyCode::Char('v'));
        assert_eq!(app.screener.displayed_count(), 1);
        assert_eq!(app.selected, Some(0));

        app.handle_key(KeyCode::Char('p'));
        type_text(&mut app, "999999");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.selected, None);
    }

    #[test]
    fn category_cycle() {
        let mut f = CategoryFilter::All;
        let mut seen = Vec::new();
        for _ in 0..4 {
            f = next_category(&f);
            seen.push(f.to_string());
        }
        assert_eq!(seen, ["linear", "inverse", "spot", "all"]);
        assert_eq!(next_category(&CategoryFilter::from_tag("option")), CategoryFilter::All);
    }

    #[test]
    fn bound_input_parsing() {
        assert_eq!(parse_bound_input("").unwrap(), None);
        assert_eq!(parse_bound_input(" 12.5 ").unwrap(), Some(12.5));
        assert_eq!(parse_bound_input("0").unwrap(), Some(0.0));
        assert!(parse_bound_input("abc").is_err());
        assert!(parse_bound_input("NaN").is_err());
    }
}

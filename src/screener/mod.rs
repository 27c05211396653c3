pub mod criteria;
pub mod view;

pub use criteria::Criteria;
pub use view::{derive_view, ViewCache};

use tracing::debug;

use crate::fetcher::PairSource;
use crate::state::PairStore;
use crate::types::{CategoryFilter, ChangeFilter, SortField, TradingPair};

/// What the presentation layer should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    /// Loaded, but nothing passes the filters (or the load came back empty).
    Empty,
    Rows(usize),
}

/// Owns the store, the criteria and the memoized view. Every user action goes
/// through here; the derived rows are read back with [`Screener::rows`].
#[derive(Debug)]
pub struct Screener {
    store: PairStore,
    criteria: Criteria,
    cache: ViewCache,
}

impl Default for Screener {
    fn default() -> Self {
        Self::new(Criteria::default())
    }
}

impl Screener {
    pub fn new(criteria: Criteria) -> Self {
        Self {
            store: PairStore::new(),
            criteria,
            cache: ViewCache::new(),
        }
    }

    pub async fn load<S: PairSource>(&mut self, source: &S) {
        self.store.load(source).await;
    }

    pub fn begin_load(&mut self) {
        self.store.begin_load();
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    /// Filtered and sorted rows for the current snapshot and criteria.
    pub fn rows(&mut self) -> Vec<&TradingPair> {
        let snapshot = self.store.snapshot();
        self.cache
            .indices(self.store.generation(), snapshot, &self.criteria)
            .iter()
            .map(|&i| &snapshot[i])
            .collect()
    }

    pub fn displayed_count(&mut self) -> usize {
        self.cache
            .indices(self.store.generation(), self.store.snapshot(), &self.criteria)
            .len()
    }

    pub fn view_state(&mut self) -> ViewState {
        if self.is_loading() {
            return ViewState::Loading;
        }
        match self.displayed_count() {
            0 => ViewState::Empty,
            n => ViewState::Rows(n),
        }
    }

    // -- criteria mutators ---------------------------------------------------

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.criteria.search_text = text.into();
        debug!(search = %self.criteria.search_text, "search changed");
    }

    pub fn set_category_filter(&mut self, filter: CategoryFilter) {
        debug!(category = %filter, "category filter changed");
        self.criteria.category_filter = filter;
    }

    pub fn set_change_filter(&mut self, filter: ChangeFilter) {
        debug!(change = %filter, "change filter changed");
        self.criteria.change_filter = filter;
    }

    pub fn set_min_price(&mut self, min: Option<f64>) {
        debug!(min_price = ?min, "min price changed");
        self.criteria.min_price = min;
    }

    pub fn set_min_volume(&mut self, min: Option<f64>) {
        debug!(min_volume = ?min, "min volume changed");
        self.criteria.min_volume = min;
    }

    pub fn activate_sort(&mut self, field: SortField) {
        self.criteria.activate_sort(field);
        debug!(
            field = %self.criteria.sort_field,
            direction = %self.criteria.sort_direction,
            "sort changed"
        );
    }

    pub fn reset(&mut self) {
        self.criteria.reset();
        debug!("criteria reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::types::SortDirection;

    struct Fixed(Vec<TradingPair>);

    impl PairSource for Fixed {
        async fn fetch_pairs(&self) -> Result<Vec<TradingPair>> {
            Ok(self.0.clone())
        }
    }

    struct Down;

    impl PairSource for Down {
        async fn fetch_pairs(&self) -> Result<Vec<TradingPair>> {
            Err(AppError::Config("unreachable host".to_string()))
        }
    }

    fn snapshot() -> Vec<TradingPair> {
        serde_json::from_str(
            r#"[
            {"id":1,"symbol":"BTCUSDT","category":"linear","last_price":"65000.1234","volume_24h":"500000000","funding_rate":"0.000100","price_change_percent_24h":"2.50"},
            {"id":2,"symbol":"ETHUSDT","category":"spot","last_price":"3000.50","volume_24h":"200000000","funding_rate":"-0.000050","price_change_percent_24h":"-1.20"}
        ]"#,
        )
        .unwrap()
    }

    fn symbols(screener: &mut Screener) -> Vec<String> {
        screener.rows().iter().map(|p| p.symbol.clone()).collect()
    }

    #[tokio::test]
    async fn loading_until_first_load_finishes() {
        let mut screener = Screener::default();
        assert_eq!(screener.view_state(), ViewState::Loading);
        screener.load(&Fixed(snapshot())).await;
        assert_eq!(screener.view_state(), ViewState::Rows(2));
        assert_eq!(symbols(&mut screener), ["BTCUSDT", "ETHUSDT"]);
    }

    #[tokio::test]
    async fn failed_load_reads_as_empty_not_loading() {
        let mut screener = Screener::default();
        screener.load(&Down).await;
        assert_eq!(screener.view_state(), ViewState::Empty);
        assert_eq!(screener.displayed_count(), 0);
    }

    #[tokio::test]
    async fn mutators_feed_the_view() {
        let mut screener = Screener::default();
        screener.load(&Fixed(snapshot())).await;

        screener.set_search_text("eth");
        assert_eq!(symbols(&mut screener), ["ETHUSDT"]);

        screener.set_search_text("");
        screener.set_change_filter(ChangeFilter::Negative);
        assert_eq!(symbols(&mut screener), ["ETHUSDT"]);

        screener.set_change_filter(ChangeFilter::All);
        screener.set_min_volume(Some(300_000_000.0));
        assert_eq!(symbols(&mut screener), ["BTCUSDT"]);

        screener.set_min_volume(None);
        screener.set_min_price(Some(1_000_000.0));
        assert_eq!(screener.view_state(), ViewState::Empty);

        screener.set_min_price(None);
        screener.set_category_filter(CategoryFilter::from_tag("spot"));
        assert_eq!(symbols(&mut screener), ["ETHUSDT"]);

        screener.reset();
        assert_eq!(symbols(&mut screener), ["BTCUSDT", "ETHUSDT"]);
    }

    #[tokio::test]
    async fn sort_activation_reorders_rows() {
        let mut screener = Screener::default();
        screener.load(&Fixed(snapshot())).await;

        screener.activate_sort(SortField::LastPrice);
        assert_eq!(screener.criteria().sort_direction, SortDirection::Desc);
        assert_eq!(symbols(&mut screener), ["BTCUSDT", "ETHUSDT"]);

        screener.activate_sort(SortField::LastPrice);
        assert_eq!(screener.criteria().sort_direction, SortDirection::Asc);
        assert_eq!(symbols(&mut screener), ["ETHUSDT", "BTCUSDT"]);

        screener.activate_sort(SortField::FundingRate);
        assert_eq!(screener.criteria().sort_direction, SortDirection::Desc);
        assert_eq!(symbols(&mut screener), ["BTCUSDT", "ETHUSDT"]);
    }

    #[tokio::test]
    async fn reload_refreshes_cached_view() {
        let mut screener = Screener::default();
        screener.load(&Fixed(snapshot())).await;
        assert_eq!(screener.displayed_count(), 2);

        let mut smaller = snapshot();
        smaller.truncate(1);
        screener.load(&Fixed(smaller)).await;
        assert_eq!(symbols(&mut screener), ["BTCUSDT"]);
    }
}

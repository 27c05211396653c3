use std::sync::Arc;

use tracing::{info, warn};

use crate::fetcher::PairSource;
use crate::types::TradingPair;

// ---------------------------------------------------------------------------
// PairStore
// ---------------------------------------------------------------------------

/// Latest snapshot of trading pairs plus the pending-load flag.
///
/// The snapshot is only ever swapped for a new one. `generation` increases
/// with every swap so derived views can tell snapshots apart cheaply.
#[derive(Debug)]
pub struct PairStore {
    snapshot: Arc<[TradingPair]>,
    loading: bool,
    generation: u64,
}

impl Default for PairStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PairStore {
    /// Empty store, pending its first load.
    pub fn new() -> Self {
        Self {
            snapshot: Arc::from(Vec::new()),
            loading: true,
            generation: 0,
        }
    }

    pub fn snapshot(&self) -> &[TradingPair] {
        &self.snapshot
    }

    /// Shared handle to the current snapshot.
    #[cfg(test)]
    pub fn snapshot_arc(&self) -> Arc<[TradingPair]> {
        Arc::clone(&self.snapshot)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mark a (re)load as pending. The current snapshot stays until the load
    /// finishes.
    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// One read from `source`. Errors are logged and swallowed: the snapshot
    /// ends up empty and the pending flag is cleared either way.
    pub async fn load<S: PairSource>(&mut self, source: &S) {
        self.begin_load();
        match source.fetch_pairs().await {
            Ok(pairs) => {
                info!("Loaded {} trading pairs", pairs.len());
                self.replace(pairs);
            }
            Err(e) => {
                warn!("Trading pairs load failed: {e}");
                self.replace(Vec::new());
            }
        }
    }

    fn replace(&mut self, pairs: Vec<TradingPair>) {
        self.snapshot = Arc::from(pairs);
        self.generation += 1;
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        pairs: Vec<TradingPair>,
        calls: AtomicUsize,
    }

    impl PairSource for FixedSource {
        async fn fetch_pairs(&self) -> Result<Vec<TradingPair>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.pairs.clone())
        }
    }

    struct FailingSource;

    impl PairSource for FailingSource {
        async fn fetch_pairs(&self) -> Result<Vec<TradingPair>> {
            Err(AppError::Status {
                status: 503,
                url: "http://test/trading-pairs/".to_string(),
            })
        }
    }

    fn pair(id: i64, symbol: &str) -> TradingPair {
        TradingPair {
            id,
            symbol: symbol.to_string(),
            category: "linear".to_string(),
            last_price: "1".to_string(),
            volume_24h: "1".to_string(),
            funding_rate: "0".to_string(),
            price_change_percent_24h: "0".to_string(),
        }
    }

    #[test]
    fn starts_empty_and_pending() {
        let store = PairStore::new();
        assert!(store.is_loading());
        assert!(store.snapshot().is_empty());
        assert_eq!(store.generation(), 0);
    }

    #[tokio::test]
    async fn successful_load_replaces_snapshot() {
        let source = FixedSource {
            pairs: vec![pair(1, "BTCUSDT"), pair(2, "ETHUSDT")],
            calls: AtomicUsize::new(0),
        };
        let mut store = PairStore::new();
        store.load(&source).await;

        assert!(!store.is_loading());
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(store.snapshot()[0].symbol, "BTCUSDT");
        assert_eq!(store.generation(), 1);
        assert_eq!(source.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn failed_load_leaves_empty_snapshot_and_clears_flag() {
        let mut store = PairStore::new();
        store.load(&FailingSource).await;

        assert!(!store.is_loading());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn reload_swaps_whole_snapshot() {
        let first = FixedSource {
            pairs: vec![pair(1, "BTCUSDT")],
            calls: AtomicUsize::new(0),
        };
        let second = FixedSource {
            pairs: vec![pair(2, "ETHUSDT"), pair(3, "SOLUSDT")],
            calls: AtomicUsize::new(0),
        };
        let mut store = PairStore::new();
        store.load(&first).await;
        let old = store.snapshot_arc();

        store.load(&second).await;
        assert_eq!(store.generation(), 2);
        assert_eq!(store.snapshot().len(), 2);
        // Earlier handle still sees the earlier snapshot.
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].symbol, "BTCUSDT");

        store.load(&FailingSource).await;
        assert!(store.snapshot().is_empty());
        assert_eq!(store.generation(), 3);
    }
}

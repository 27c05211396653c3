use std::cmp::Ordering;

use crate::screener::criteria::Criteria;
use crate::types::{ChangeFilter, SortDirection, TradingPair};

/// Filter and sort a snapshot. Pure: the snapshot is not touched and equal
/// inputs always give the same sequence.
pub fn derive_view<'a>(snapshot: &'a [TradingPair], criteria: &Criteria) -> Vec<&'a TradingPair> {
    derive_indices(snapshot, criteria)
        .into_iter()
        .map(|i| &snapshot[i])
        .collect()
}

/// Same as [`derive_view`] but yields snapshot positions.
pub fn derive_indices(snapshot: &[TradingPair], criteria: &Criteria) -> Vec<usize> {
    let needle = criteria.search_text.to_lowercase();

    let mut keyed: Vec<(usize, Option<f64>)> = snapshot
        .iter()
        .enumerate()
        .filter(|(_, pair)| passes(pair, criteria, &needle))
        .map(|(i, pair)| (i, pair.numeric(criteria.sort_field)))
        .collect();

    // sort_by is stable: equal keys keep snapshot order in both directions.
    keyed.sort_by(|(_, a), (_, b)| match criteria.sort_direction {
        SortDirection::Asc => compare_keys(*a, *b),
        SortDirection::Desc => compare_keys(*b, *a),
    });

    keyed.into_iter().map(|(i, _)| i).collect()
}

/// All five predicates. `needle` is the lower-cased search text.
fn passes(pair: &TradingPair, criteria: &Criteria, needle: &str) -> bool {
    matches_search(pair, needle)
        && criteria.category_filter.matches(&pair.category)
        && matches_change(pair, criteria.change_filter)
        && at_least(pair.last_price(), criteria.min_price)
        && at_least(pair.volume_24h(), criteria.min_volume)
}

fn matches_search(pair: &TradingPair, needle: &str) -> bool {
    needle.is_empty() || pair.symbol.to_lowercase().contains(needle)
}

/// Unparseable change never lands in the positive or negative bucket.
fn matches_change(pair: &TradingPair, filter: ChangeFilter) -> bool {
    match filter {
        ChangeFilter::All => true,
        ChangeFilter::Positive => pair.price_change_percent_24h().is_some_and(|c| c >= 0.0),
        ChangeFilter::Negative => pair.price_change_percent_24h().is_some_and(|c| c < 0.0),
    }
}

fn at_least(value: Option<f64>, bound: Option<f64>) -> bool {
    match bound {
        None => true,
        Some(min) => value.is_some_and(|v| v >= min),
    }
}

/// Ascending order with unparseable values below every number. Numerically
/// equal values tie, so `-0.0` and `0.0` keep their input order.
pub fn compare_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// ViewCache
// ---------------------------------------------------------------------------

/// Remembers the last derivation keyed on (snapshot generation, criteria).
/// Only saves work; [`derive_indices`] gives the same answer without it.
#[derive(Debug, Default)]
pub struct ViewCache {
    key: Option<(u64, Criteria)>,
    indices: Vec<usize>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indices(&mut self, generation: u64, snapshot: &[TradingPair], criteria: &Criteria) -> &[usize] {
        let hit = matches!(&self.key, Some((g, c)) if *g == generation && c == criteria);
        if !hit {
            self.indices = derive_indices(snapshot, criteria);
            self.key = Some((generation, criteria.clone()));
        }
        &self.indices
    }
}

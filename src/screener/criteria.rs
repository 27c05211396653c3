use crate::types::{CategoryFilter, ChangeFilter, SortDirection, SortField};

pub const DEFAULT_SORT_FIELD: SortField = SortField::PriceChangePercent24h;
pub const DEFAULT_SORT_DIRECTION: SortDirection = SortDirection::Desc;

/// User-chosen filter and sort parameters. Valid for any snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    pub search_text: String,
    pub category_filter: CategoryFilter,
    pub change_filter: ChangeFilter,
    /// Inclusive lower bound on last price. `None` = unconstrained.
    pub min_price: Option<f64>,
    /// Inclusive lower bound on 24h volume. `None` = unconstrained.
    pub min_volume: Option<f64>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            category_filter: CategoryFilter::All,
            change_filter: ChangeFilter::All,
            min_price: None,
            min_volume: None,
            sort_field: DEFAULT_SORT_FIELD,
            sort_direction: DEFAULT_SORT_DIRECTION,
        }
    }
}

impl Criteria {
    /// Column-header click. Same column flips direction; a new column always
    /// starts descending.
    pub fn activate_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Desc;
        }
    }

    /// Restore every filter and the sort control to their defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

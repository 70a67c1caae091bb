use chrono::NaiveDate;

use crate::model::{ForecastRecord, ForecastTable, ProductId};

/// Borrowed subset of a [`ForecastTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    rows: Vec<&'a ForecastRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn rows(&self) -> &[&'a ForecastRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ascending by forecast date; rows on the same date keep source order.
    pub fn sorted_by_date(mut self) -> Self {
        self.rows.sort_by_key(|r| r.forecast_date);
        self
    }
}

/// Rows for exactly `product` with `start <= forecast_date <= end`.
///
/// Output order is source order.
pub fn filter<'a>(
    table: &'a ForecastTable,
    product: &ProductId,
    start: NaiveDate,
    end: NaiveDate,
) -> FilteredView<'a> {
    let rows = table
        .records()
        .iter()
        .filter(|r| &r.product_id == product)
        .filter(|r| (start..=end).contains(&r.forecast_date))
        .collect();
    FilteredView { rows }
}

use chrono::NaiveDate;
use tracing::debug;

use crate::filter::{filter, FilteredView};
use crate::model::{FilterSelection, ForecastTable, ProductId};

/// What the dashboard shows for one (table, selection) pair.
#[derive(Debug, PartialEq)]
pub enum DashboardView<'a> {
    /// Source returned no rows; only the notice is shown.
    NoData,
    Ready(ForecastView<'a>),
}

#[derive(Debug, PartialEq)]
pub struct ForecastView<'a> {
    /// Selector options, distinct and sorted.
    pub products: Vec<ProductId>,
    /// Full span of the table, the date picker default.
    pub date_bounds: (NaiveDate, NaiveDate),
    pub product: ProductId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Filtered rows in ascending date order.
    pub rows: FilteredView<'a>,
    /// `(forecast_date, forecast_quantity)` points for the chart.
    pub series: Vec<(NaiveDate, f64)>,
}

impl ForecastView<'_> {
    pub fn range_inverted(&self) -> bool {
        self.start > self.end
    }
}

/// Resolve the selection against the table and filter.
///
/// An unset or unknown product falls back to the first option. A missing
/// range endpoint falls back to the table's min or max date, so a half-picked
/// range never reaches the filter.
pub fn render<'a>(table: &'a ForecastTable, selection: &FilterSelection) -> DashboardView<'a> {
    let Some(date_bounds) = table.date_span() else {
        return DashboardView::NoData;
    };
    let products = table.product_ids();

    let product = match &selection.product {
        Some(p) if products.contains(p) => p.clone(),
        _ => match products.first() {
            Some(p) => p.clone(),
            None => return DashboardView::NoData,
        },
    };
    let start = selection.start.unwrap_or(date_bounds.0);
    let end = selection.end.unwrap_or(date_bounds.1);

    let rows = filter(table, &product, start, end).sorted_by_date();
    let series = rows
        .rows()
        .iter()
        .map(|r| (r.forecast_date, r.forecast_quantity))
        .collect();
    debug!(%product, %start, %end, rows = rows.len(), "filtered forecast table");

    DashboardView::Ready(ForecastView {
        products,
        date_bounds,
        product,
        start,
        end,
        rows,
        series,
    })
}

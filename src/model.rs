use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde_json::Value;

pub const PRODUCT_ID: &str = "product_id";
pub const FORECAST_DATE: &str = "forecast_date";
pub const FORECAST_QUANTITY: &str = "forecast_quantity";

/// Product identifiers arrive either as integers or as text.
///
/// Integers sort before text so the selector lists numeric ids first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProductId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Int(v) => write!(f, "{v}"),
            ProductId::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        ProductId::Text(s.to_string())
    }
}

impl From<i64> for ProductId {
    fn from(v: i64) -> Self {
        ProductId::Int(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub product_id: ProductId,
    pub forecast_date: NaiveDate,
    pub forecast_quantity: f64,
    /// Any other columns of the source row, shown untouched in the table.
    pub extra: BTreeMap<String, Value>,
}

impl ForecastRecord {
    /// Display text for any column of the row.
    pub fn cell_text(&self, column: &str) -> String {
        match column {
            PRODUCT_ID => self.product_id.to_string(),
            FORECAST_DATE => self.forecast_date.to_string(),
            FORECAST_QUANTITY => format_quantity(self.forecast_quantity),
            other => match self.extra.get(other) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(v) => v.to_string(),
            },
        }
    }

    #[cfg(test)]
    pub fn new(product_id: impl Into<ProductId>, forecast_date: NaiveDate, forecast_quantity: f64) -> Self {
        Self {
            product_id: product_id.into(),
            forecast_date,
            forecast_quantity,
            extra: BTreeMap::new(),
        }
    }
}

pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Rows of `inventory_forecast_metrics` in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastTable {
    records: Vec<ForecastRecord>,
    /// Every column name, in the order the source sent them.
    columns: Vec<String>,
}

impl ForecastTable {
    /// Callers guarantee each record carries exactly `columns`.
    pub fn with_columns(records: Vec<ForecastRecord>, columns: Vec<String>) -> Self {
        Self { records, columns }
    }

    /// Known columns first, then the first record's extra columns.
    #[cfg(test)]
    pub fn from_records(records: Vec<ForecastRecord>) -> Self {
        let mut columns: Vec<String> = [PRODUCT_ID, FORECAST_DATE, FORECAST_QUANTITY]
            .iter()
            .map(|c| c.to_string())
            .collect();
        if let Some(first) = records.first() {
            columns.extend(first.extra.keys().cloned());
        }
        Self { records, columns }
    }

    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct product ids, sorted.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.records.iter().map(|r| r.product_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Earliest and latest forecast date, `None` for an empty table.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().map(|r| r.forecast_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

/// The user's current sidebar choices. Unset fields fall back to the table's
/// first product and full date span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub product: Option<ProductId>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

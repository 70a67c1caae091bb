use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{ForecastSource, RawRow};
use crate::error::{DashboardError, DashboardResult};
use crate::model::{
    ForecastRecord, ForecastTable, ProductId, FORECAST_DATE, FORECAST_QUANTITY, PRODUCT_ID,
};

pub const FORECAST_TABLE: &str = "inventory_forecast_metrics";

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Fetch every row of the forecast table and type it.
pub fn load_forecast_table(source: &dyn ForecastSource) -> DashboardResult<ForecastTable> {
    let rows = source.select_all(FORECAST_TABLE)?;
    let table = build_table(rows)?;

    if table.is_empty() {
        warn!(table = FORECAST_TABLE, "query returned no rows");
    } else {
        info!(table = FORECAST_TABLE, rows = table.len(), "loaded forecast table");
    }
    Ok(table)
}

/// Column order follows the first row; later rows may list the same
/// columns in any order.
pub fn build_table(rows: Vec<RawRow>) -> DashboardResult<ForecastTable> {
    let mut columns: Vec<String> = Vec::new();
    let mut schema: Option<Vec<String>> = None;
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.into_iter().enumerate() {
        let mut keys: Vec<String> = row.keys().cloned().collect();
        if schema.is_none() {
            columns = keys.clone();
        }
        keys.sort();
        match &schema {
            Some(expected) if *expected != keys => {
                return Err(DashboardError::SchemaMismatch { row: i });
            }
            Some(_) => {}
            None => schema = Some(keys),
        }
        records.push(parse_row(i, row)?);
    }

    Ok(ForecastTable::with_columns(records, columns))
}

fn parse_row(row: usize, mut raw: RawRow) -> DashboardResult<ForecastRecord> {
    let missing = |column: &'static str| DashboardError::InvalidRecord {
        row,
        column,
        reason: "missing".into(),
    };

    let product_id = raw.remove(PRODUCT_ID).ok_or_else(|| missing(PRODUCT_ID))?;
    let date = raw.remove(FORECAST_DATE).ok_or_else(|| missing(FORECAST_DATE))?;
    let quantity = raw
        .remove(FORECAST_QUANTITY)
        .ok_or_else(|| missing(FORECAST_QUANTITY))?;

    Ok(ForecastRecord {
        product_id: parse_product_id(row, product_id)?,
        forecast_date: parse_date(row, &date)?,
        forecast_quantity: parse_quantity(row, quantity)?,
        extra: raw.into_iter().collect::<BTreeMap<_, _>>(),
    })
}

fn parse_product_id(row: usize, value: Value) -> DashboardResult<ProductId> {
    match value {
        Value::String(s) => Ok(ProductId::Text(s)),
        Value::Number(n) => n.as_i64().map(ProductId::Int).ok_or_else(|| DashboardError::InvalidRecord {
            row,
            column: PRODUCT_ID,
            reason: format!("{n} is not an integer id"),
        }),
        other => Err(DashboardError::InvalidRecord {
            row,
            column: PRODUCT_ID,
            reason: format!("expected string or integer, got {other}"),
        }),
    }
}

fn parse_quantity(row: usize, value: Value) -> DashboardResult<f64> {
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|q| q.is_finite())
        .ok_or_else(|| DashboardError::InvalidRecord {
            row,
            column: FORECAST_QUANTITY,
            reason: format!("expected a number, got {value}"),
        })
}

fn parse_date(row: usize, value: &Value) -> DashboardResult<NaiveDate> {
    let invalid = || DashboardError::InvalidDate {
        row,
        value: value.to_string(),
    };
    let text = value.as_str().ok_or_else(invalid)?;
    parse_date_text(text.trim()).ok_or_else(invalid)
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `T`/space separated
/// timestamps; only the calendar date is kept.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.date_naive());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|ts| ts.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn row(v: Value) -> RawRow {
        match v {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    struct StaticSource {
        rows: Vec<RawRow>,
        calls: AtomicUsize,
    }

    impl ForecastSource for StaticSource {
        fn select_all(&self, table: &str) -> DashboardResult<Vec<RawRow>> {
            assert_eq!(table, FORECAST_TABLE);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }
    }

    #[test]
    fn accepted_date_formats() {
        assert_eq!(parse_date_text("2024-01-05"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05T00:00:00"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05 13:45:10.250"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05T23:30:00+00:00"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05T01:00:00Z"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_text("05/01/2024"), None);
        assert_eq!(parse_date_text(""), None);
    }

    #[test]
    fn loads_typed_rows_and_keeps_extra_columns() {
        let source = StaticSource {
            rows: vec![
                row(json!({"id": 1, "product_id": "P1", "forecast_date": "2024-01-05", "forecast_quantity": 15})),
                row(json!({"id": 2, "product_id": 7, "forecast_date": "2024-01-01", "forecast_quantity": "10.5"})),
            ],
            calls: AtomicUsize::new(0),
        };

        let table = load_forecast_table(&source).unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.columns(),
            ["id", "product_id", "forecast_date", "forecast_quantity"]
        );

        let first = &table.records()[0];
        assert_eq!(first.product_id, ProductId::from("P1"));
        assert_eq!(first.forecast_date, d(2024, 1, 5));
        assert_eq!(first.forecast_quantity, 15.0);
        assert_eq!(first.extra["id"], json!(1));

        let second = &table.records()[1];
        assert_eq!(second.product_id, ProductId::Int(7));
        assert_eq!(second.forecast_quantity, 10.5);
    }

    #[test]
    fn zero_rows_is_an_empty_table() {
        let table = build_table(Vec::new()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn bad_date_fails_fast_with_row_index() {
        let err = build_table(vec![
            row(json!({"product_id": "P1", "forecast_date": "2024-01-01", "forecast_quantity": 1})),
            row(json!({"product_id": "P1", "forecast_date": "soon", "forecast_quantity": 1})),
        ])
        .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidDate { row: 1, .. }));

        let err = build_table(vec![row(json!({"product_id": "P1", "forecast_date": null, "forecast_quantity": 1}))])
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidDate { row: 0, .. }));
    }

    #[test]
    fn missing_or_mistyped_columns() {
        let err = build_table(vec![row(json!({"product_id": "P1", "forecast_date": "2024-01-01"}))]).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::InvalidRecord { row: 0, column: "forecast_quantity", .. }
        ));

        let err = build_table(vec![row(
            json!({"product_id": true, "forecast_date": "2024-01-01", "forecast_quantity": 1}),
        )])
        .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRecord { column: "product_id", .. }));

        let err = build_table(vec![row(
            json!({"product_id": "P1", "forecast_date": "2024-01-01", "forecast_quantity": "lots"}),
        )])
        .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRecord { column: "forecast_quantity", .. }));
    }

    #[test]
    fn columns_keep_source_order() {
        let table = build_table(vec![
            row(json!({"forecast_date": "2024-01-01", "created_at": "2024-01-01T08:00:00Z", "product_id": "P1", "forecast_quantity": 1, "id": 9})),
            row(json!({"id": 10, "product_id": "P2", "forecast_quantity": 2, "created_at": "2024-01-01T08:00:00Z", "forecast_date": "2024-01-02"})),
        ])
        .unwrap();
        assert_eq!(
            table.columns(),
            ["forecast_date", "created_at", "product_id", "forecast_quantity", "id"]
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn rows_must_share_a_schema() {
        let err = build_table(vec![
            row(json!({"product_id": "P1", "forecast_date": "2024-01-01", "forecast_quantity": 1})),
            row(json!({"product_id": "P1", "forecast_date": "2024-01-02", "forecast_quantity": 1, "note": "x"})),
        ])
        .unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch { row: 1 }));
    }
}

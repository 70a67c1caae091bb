//! Error types for loading the forecast table.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("environment variable {name} has an invalid value: {reason}")]
    InvalidEnv { name: &'static str, reason: String },

    #[error("invalid Supabase URL {value:?}: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("data source answered with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A row is missing a column or carries a value of the wrong kind.
    #[error("row {row}: column {column}: {reason}")]
    InvalidRecord {
        row: usize,
        column: &'static str,
        reason: String,
    },

    #[error("row {row}: unparsable forecast_date {value}")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: columns differ from the first row")]
    SchemaMismatch { row: usize },
}

pub type DashboardResult<T> = Result<T, DashboardError>;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};

/// One untyped row as returned by the data source.
pub type RawRow = Map<String, Value>;

/// Read access to a remote table: every row, every column.
pub trait ForecastSource: Send + Sync {
    fn select_all(&self, table: &str) -> DashboardResult<Vec<RawRow>>;
}

/// Talks to the Supabase REST endpoint (`/rest/v1/<table>`).
pub struct SupabaseClient {
    http: Client,
    base_url: String,
}

impl SupabaseClient {
    pub fn connect(config: &DashboardConfig) -> DashboardResult<Self> {
        let invalid_key = |_| DashboardError::InvalidEnv {
            name: crate::config::KEY_VAR,
            reason: "key is not a valid header value".into(),
        };

        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&config.key).map_err(invalid_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.key)).map_err(invalid_key)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        let base_url = config.url.as_str().trim_end_matches('/').to_string();
        info!(url = %base_url, "connected to Supabase");

        Ok(Self { http, base_url })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

impl ForecastSource for SupabaseClient {
    fn select_all(&self, table: &str) -> DashboardResult<Vec<RawRow>> {
        let url = self.table_url(table);
        debug!(%url, "selecting all rows");

        let response = self.http.get(&url).query(&[("select", "*")]).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(DashboardError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<RawRow> = serde_json::from_str(&body)?;
        Ok(rows)
    }
}

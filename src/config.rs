use std::time::Duration;

use url::Url;

use crate::error::{DashboardError, DashboardResult};

pub const URL_VAR: &str = "SUPABASE_URL";
pub const KEY_VAR: &str = "SUPABASE_KEY";
pub const TIMEOUT_VAR: &str = "FORECAST_DASHBOARD_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything needed to reach the forecast table.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub url: Url,
    pub key: String,
    pub timeout: Duration,
}

impl DashboardConfig {
    /// Read the configuration from the process environment.
    ///
    /// `.env` is loaded by `main` before this runs.
    pub fn from_env() -> DashboardResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> DashboardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup(URL_VAR).ok_or(DashboardError::MissingEnv(URL_VAR))?;
        let url = Url::parse(raw_url.trim()).map_err(|source| DashboardError::InvalidUrl {
            value: raw_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DashboardError::InvalidEnv {
                name: URL_VAR,
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        let key = lookup(KEY_VAR)
            .ok_or(DashboardError::MissingEnv(KEY_VAR))?
            .trim()
            .to_string();
        if key.is_empty() {
            return Err(DashboardError::InvalidEnv {
                name: KEY_VAR,
                reason: "empty key".into(),
            });
        }

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(DashboardError::InvalidEnv {
                        name: TIMEOUT_VAR,
                        reason: format!("expected a positive number of seconds, got {v:?}"),
                    })
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            url,
            key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

use std::sync::Arc;

use tracing::info;

use crate::cache::ResourceCache;
use crate::client::ForecastSource;
use crate::error::DashboardResult;
use crate::loader::load_forecast_table;
use crate::model::ForecastTable;

pub type Connector = Box<dyn Fn() -> DashboardResult<Arc<dyn ForecastSource>>>;

/// Owns the two cached resources: the source connection and the loaded table.
pub struct Session {
    connect: Connector,
    source: ResourceCache<dyn ForecastSource>,
    table: ResourceCache<ForecastTable>,
}

impl Session {
    pub fn new(connect: Connector) -> Self {
        Self {
            connect,
            source: ResourceCache::new(),
            table: ResourceCache::new(),
        }
    }

    /// The forecast table, fetched on first use.
    pub fn table(&self) -> DashboardResult<Arc<ForecastTable>> {
        self.table.get_or_try_init(|| {
            let source = self.source.get_or_try_init(|| (self.connect)())?;
            load_forecast_table(source.as_ref()).map(Arc::new)
        })
    }

    /// Drop the cached table; the connection is kept.
    pub fn invalidate_table(&mut self) {
        info!("forecast table cache invalidated");
        self.table.invalidate();
    }

    /// Drop both the connection and the table.
    pub fn reset(&mut self) {
        info!("session reset");
        self.table.invalidate();
        self.source.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RawRow;
    use crate::error::DashboardError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fetches: Arc<AtomicUsize>,
    }

    impl ForecastSource for CountingSource {
        fn select_all(&self, _table: &str) -> DashboardResult<Vec<RawRow>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let row = json!({"product_id": "P1", "forecast_date": "2024-01-01", "forecast_quantity": 10});
            Ok(vec![row.as_object().cloned().unwrap_or_default()])
        }
    }

    fn counting_session() -> (Session, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let fetches = Arc::new(AtomicUsize::new(0));
        let (c, f) = (connects.clone(), fetches.clone());
        let session = Session::new(Box::new(move || -> DashboardResult<Arc<dyn ForecastSource>> {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(CountingSource { fetches: f.clone() }) as Arc<dyn ForecastSource>)
        }));
        (session, connects, fetches)
    }

    #[test]
    fn table_is_fetched_once_per_session() {
        let (session, connects, fetches) = counting_session();

        let a = session.table().unwrap();
        let b = session.table().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 1);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidating_the_table_refetches_on_the_same_connection() {
        let (mut session, connects, fetches) = counting_session();
        session.table().unwrap();
        session.invalidate_table();
        session.table().unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        session.reset();
        session.table().unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn connection_failure_propagates() {
        let session = Session::new(Box::new(|| -> DashboardResult<Arc<dyn ForecastSource>> {
            Err(DashboardError::MissingEnv("SUPABASE_URL"))
        }));
        assert!(matches!(session.table(), Err(DashboardError::MissingEnv("SUPABASE_URL"))));
    }
}

mod cache;
mod client;
mod config;
mod error;
mod filter;
mod loader;
mod model;
mod session;
mod ui;
mod view;

use std::sync::Arc;

use client::{ForecastSource, SupabaseClient};
use config::DashboardConfig;
use error::DashboardResult;
use eframe::egui;
use session::Session;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ui::DashboardApp;

fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_forecast_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    info!("inventory forecast dashboard starting");

    // Credentials are read when the first frame asks for data, so a missing
    // variable shows up as a connection failure in the window.
    let session = Session::new(Box::new(|| -> DashboardResult<Arc<dyn ForecastSource>> {
        let config = DashboardConfig::from_env()?;
        let client = SupabaseClient::connect(&config)?;
        Ok(Arc::new(client) as Arc<dyn ForecastSource>)
    }));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Inventory Forecast Dashboard")
            .with_inner_size([1600.0, 1000.0])
            .with_min_inner_size([1000.0, 650.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Inventory Forecast Dashboard",
        options,
        Box::new(move |cc| {
            ui::set_custom_style(&cc.egui_ctx);
            Ok(Box::new(DashboardApp::new(session)))
        }),
    )
}

mod analysis;
mod app;
mod color;
mod config;
mod data;
mod render;
mod state;
mod ui;

use app::NannoDashboardApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match DashboardConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Ignoring invalid config: {e:#}");
            DashboardConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Nanno Dashboard – Core Correlation",
        options,
        Box::new(|_cc| Ok(Box::new(NannoDashboardApp::new(config)))),
    )
}

mod app;
mod color;
mod state;
mod ui;

use anyhow::Context;
use clap::Parser;
use eframe::egui;

use app::RustyFactoryApp;
use rusty_factory::config::Config;
use rusty_factory::data::loader::load_csv;
use state::Session;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::parse();

    // A file that cannot be loaded ends the session before any window opens.
    let raw = load_csv(&config.data)
        .with_context(|| format!("loading {}", config.data.display()))?;
    let source = config.data.display().to_string();
    let session = Session::new(source, &raw);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size())
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Factory – Sensor Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(RustyFactoryApp::new(session)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe: {e}"))
}

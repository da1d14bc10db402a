use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_DATA_FILE: &str = "smart_manufacturing_data.csv";

/// Command-line configuration for the dashboard window.
#[derive(Debug, Clone, Parser)]
#[command(name = "rusty-factory", version, about = "Smart-manufacturing sensor dashboard")]
pub struct Config {
    /// Sensor CSV to load at startup.
    #[arg(env = "RUSTY_FACTORY_DATA", default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    /// Initial window width in points.
    #[arg(long, default_value_t = 1400.0)]
    pub width: f32,

    /// Initial window height in points.
    #[arg(long, default_value_t = 900.0)]
    pub height: f32,
}

impl Config {
    pub fn window_size(&self) -> [f32; 2] {
        [self.width.max(600.0), self.height.max(400.0)]
    }
}

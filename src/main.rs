// Entry point: load configuration, start logging, run the game loop
// Setup failures are logged and returned, so they reach stderr after the terminal is restored

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::{Level, error, info};

use tswpr::tsw_config::{Config, config_path, load_or_create_config, log_path};
use tswpr::tsw_ui::run;

/// Log to a file; the terminal belongs to the game while it runs
fn init_logging(cfg: &Config) {
    let Some(path) = log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let level = cfg.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cfg = load_or_create_config();
    init_logging(&cfg);
    if let Some(path) = config_path() {
        info!("config {}", path.display());
    }

    // the renderer restores the terminal before run returns
    run(&cfg).inspect_err(|e| error!("{}", e))
}

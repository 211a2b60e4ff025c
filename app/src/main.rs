use std::fs::{self, OpenOptions};

use dbpeek_core::config::BrowserConfig;
use env_logger::{Env, Target};

fn run_app(
    config: &BrowserConfig,
    run_tui: impl FnOnce(&BrowserConfig) -> Result<(), dbpeek_tui::TuiError>,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("starting dbpeek");
    run_tui(config)?;
    log::info!("dbpeek finished");
    Ok(())
}

// The terminal belongs to the TUI, so log lines go to a file.
fn init_logging(config: &BrowserConfig) -> Result<(), Box<dyn std::error::Error>> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BrowserConfig::load_default()?;
    init_logging(&config)?;
    run_app(&config, dbpeek_tui::run)
}

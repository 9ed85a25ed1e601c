//! Shadelab viewer.
//!
//! Opens a window with the welcome screen, or with the route given as the
//! first argument (for example `shadelab /shape/torus`).

mod app;
mod render;
mod ui;

use shadelab::config::ViewerConfig;
use shadelab::session::Route;

fn main() {
    let (config, config_error) = match ViewerConfig::from_env() {
        Ok(config) => (config, None),
        Err(err) => (ViewerConfig::default(), Some(err)),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter))
        .format_timestamp_millis()
        .init();

    if let Some(err) = config_error {
        log::warn!("{}; using default configuration", err);
    }

    let route = std::env::args()
        .nth(1)
        .map(|path| Route::parse(&path))
        .unwrap_or(Route::Welcome);

    log::info!("starting {} at {}", config.window_title, route);
    if let Err(err) = app::run(config, route) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

use commands::classifier::ClassificationStaticScreen;
use config::ScreenConfig;
use models::classify_types::ScreenState;
use services::classifier::model_manager::OnnxClassifierFactory;

/// Hosts the static classification screen for one lifecycle: create, read
/// back what it shows, destroy.
pub fn run(config: ScreenConfig) -> ScreenState {
    tracing::debug!("Opening screen with assets at {}", config.asset_dir.display());
    let mut screen = ClassificationStaticScreen::new(config, OnnxClassifierFactory);
    let state = screen.on_create().clone();
    screen.on_destroy();
    state
}

pub mod applier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod doctor;
pub mod images;
pub mod log;
pub mod pipeline;
pub mod rebind;
pub mod settings;
pub mod url;

pub use applier::WallpaperApplier;
pub use config::ConfigStore;
pub use settings::Settings;

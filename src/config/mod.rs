#[allow(clippy::module_inception)]
mod config;

pub use config::{InputSettings, LoggingSettings, Settings, TableSettings, TvlSettings};

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::warn;

use crate::cli::SortArg;

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Catalog file used instead of the built-in snapshot.
    pub catalog: Option<PathBuf>,
    pub currency: Option<String>,
    /// Units of `currency` per USD.
    pub exchange_rate: Option<f64>,
    pub sort: Option<SortArg>,
}

pub fn parse_config(data: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(data)
}

pub fn load_config() -> Config {
    let Some(dirs) = ProjectDirs::from("", "", "llmcost") else {
        return Config::default();
    };

    let path = dirs.config_dir().join("config.toml");
    let Ok(data) = fs::read_to_string(&path) else {
        return Config::default();
    };

    match parse_config(&data) {
        Ok(config) => config,
        Err(e) => {
            warn!("invalid config at {}: {}", path.display(), e);
            Config::default()
        }
    }
}

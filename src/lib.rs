//! Audits and normalizes the street names and postcodes of an OpenStreetMap
//! extract, and flattens its nodes and ways into JSON documents.

pub mod clean;
pub mod data;
pub mod errors;
pub mod etl;

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{Error, ErrorKind, Result};

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UserConfig {
    pub data_path: String,
    #[serde(default)]
    pub pretty: bool,
    #[serde(default)]
    pub progress: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| Error::new(ErrorKind::Config, format!("Could not open config file {}: {}", path.display(), err)))?;
    serde_json::from_reader(file)
        .map_err(|err| Error::new(ErrorKind::Config, format!("Could not parse config {}: {}", path.display(), err)))
}

/// Config for one run. `input` replaces `data_path`; with an `input` the
/// config file may be absent, in which case every other key takes its default.
pub fn resolve_user_config(config_path: &Path, input: Option<&Path>) -> Result<UserConfig> {
    let Some(input) = input else {
        return load_user_config(config_path);
    };
    let mut user_config = if config_path.exists() {
        load_user_config(config_path)?
    } else {
        UserConfig {
            data_path: String::new(),
            pretty: false,
            progress: false,
            log_level: default_log_level(),
        }
    };
    user_config.data_path = input.to_string_lossy().into_owned();
    Ok(user_config)
}

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::CONFIG_FILE;

/// Defaults and the field-alias lookup table. Aliases map a short human name
/// (e.g. "prio") to the canonical project field name ("Priority"); the core
/// receives the resolved name and never consults the table itself.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub project_number: Option<u32>,
    #[serde(default)]
    pub field_aliases: HashMap<String, String>,
}

impl Config {
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.field_aliases
            .get(name)
            .map(|s| s.as_str())
            .unwrap_or(name)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Config::default(),
    }
}

pub fn load_config_from(path: &Path) -> Config {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(config_str) => serde_json::from_str(&config_str).unwrap_or_default(),
            Err(_) => Config::default(),
        }
    } else {
        Config::default()
    }
}

pub fn save_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path().ok_or("Could not find home directory")?;

    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(path, config_str)?;

    Ok(())
}

/// Default owner, from GHSUB_OWNER or the config file.
pub fn get_owner(config: &Config) -> Option<String> {
    if let Ok(owner) = env::var("GHSUB_OWNER") {
        return Some(owner);
    }
    config.owner.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.json"));
        assert!(config.owner.is_none());
        assert!(config.field_aliases.is_empty());
    }

    #[test]
    fn round_trips_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.owner = Some("octocat".to_string());
        config
            .field_aliases
            .insert("prio".to_string(), "Priority".to_string());

        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = load_config_from(&path);
        assert_eq!(loaded.owner.as_deref(), Some("octocat"));
        assert_eq!(loaded.resolve_alias("prio"), "Priority");
        assert_eq!(loaded.resolve_alias("Status"), "Status");
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = load_config_from(&path);
        assert!(config.project_number.is_none());
    }
}

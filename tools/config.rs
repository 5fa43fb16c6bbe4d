use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 2;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";
const DEFAULT_SETTINGS_PATH: &str = "settings.redb";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub version: u32,
    pub api_url: String,
    pub settings_path: String,
    pub cached_scan: bool,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api_url: DEFAULT_API_URL.to_string(),
            settings_path: DEFAULT_SETTINGS_PATH.to_string(),
            cached_scan: true,
            user_agent: format!("multigenre-browse/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("MULTIGENRE_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

/// Reads the config at `path`, writing the defaults there first if absent.
/// The flag is `true` when the file was just created.
pub fn load_or_create_config(path: &Path) -> Result<(ClientConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ClientConfig = serde_yaml::from_str(&contents)?;
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.api_url.trim().is_empty() {
            config.api_url = DEFAULT_API_URL.to_string();
        }
        if config.settings_path.trim().is_empty() {
            config.settings_path = DEFAULT_SETTINGS_PATH.to_string();
        }
        if config.user_agent.trim().is_empty() {
            config.user_agent = ClientConfig::default().user_agent;
        }
        return Ok((config, false));
    }

    let config = ClientConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.yaml");
        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(created);
        assert!(path.exists());
        assert_eq!(config, ClientConfig::default());

        let (again, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(again, config);
    }

    #[test]
    fn partial_file_is_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 1\napi_url: \"\"\ncached_scan: false\n").unwrap();
        let (config, _) = load_or_create_config(&path).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.settings_path, DEFAULT_SETTINGS_PATH);
        assert!(!config.cached_scan);
        assert!(!config.user_agent.is_empty());
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let config_path = Path::new("/etc/multigenre/config.yaml");
        assert_eq!(
            resolve_path(config_path, "settings.redb"),
            PathBuf::from("/etc/multigenre/settings.redb")
        );
        assert_eq!(
            resolve_path(config_path, "/var/lib/settings.redb"),
            PathBuf::from("/var/lib/settings.redb")
        );
        assert_eq!(
            resolve_path(Path::new("config.yaml"), "settings.redb"),
            PathBuf::from("./settings.redb")
        );
    }
}

//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `BLOSSOM_ROOT_FOLDER` environment variable
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops a service from starting: a
//! warning is logged and compiled defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "BLOSSOM_ROOT_FOLDER";

/// Environment variable naming an explicit config file
pub const CONFIG_FILE_ENV: &str = "BLOSSOM_CONFIG";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "blossom.db";

/// Default port for blossom-api
pub const DEFAULT_API_PORT: u16 = 8030;

/// Default port for blossom-web
pub const DEFAULT_WEB_PORT: u16 = 8031;

/// Values used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub bind_address: String,
    pub api_port: u16,
    pub web_port: u16,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            bind_address: "127.0.0.1".to_string(),
            api_port: DEFAULT_API_PORT,
            web_port: DEFAULT_WEB_PORT,
        }
    }
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub api_port: Option<u16>,
    pub web_port: Option<u16>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load the first config file found; an empty config when there is none
    pub fn discover() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load(&path)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            None => Ok(Self::default()),
        }
    }

    /// Like [`TomlConfig::discover`], but errors are logged and swallowed.
    pub fn load_or_default() -> Self {
        match Self::discover() {
            Ok(config) => {
                info!("Config file settings loaded");
                config
            }
            Err(e) => {
                warn!("Ignoring config file, using defaults: {}", e);
                Self::default()
            }
        }
    }
}

/// Settings every service needs after resolution
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub bind_address: String,
    pub port: u16,
}

impl ServiceConfig {
    /// Merge CLI values, the TOML file and compiled defaults.
    ///
    /// `port_override` is the CLI/env port; `toml_port` picks the service's key from
    /// the TOML file; `default_port` is the compiled fallback.
    pub fn resolve(
        cli_root: Option<&Path>,
        port_override: Option<u16>,
        toml: &TomlConfig,
        toml_port: fn(&TomlConfig) -> Option<u16>,
        default_port: u16,
    ) -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        let root_folder = RootFolderResolver::new(toml.clone())
            .with_cli_arg(cli_root.map(Path::to_path_buf))
            .resolve();

        Self {
            root_folder,
            log_level: toml.log_level.clone().unwrap_or(defaults.log_level),
            bind_address: toml.bind_address.clone().unwrap_or(defaults.bind_address),
            port: port_override.or_else(|| toml_port(toml)).unwrap_or(default_port),
        }
    }

    /// `host:port` to bind the HTTP listener to
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Resolves the root folder following the priority order above
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml: TomlConfig,
}

impl RootFolderResolver {
    pub fn new(toml: TomlConfig) -> Self {
        Self { cli_arg: None, toml }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml.root_folder {
            return path.clone();
        }

        default_root_folder()
    }
}

/// Creates the root folder and locates files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

/// First existing config file: `$BLOSSOM_CONFIG`, then the user config dir, then /etc
fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        warn!("{} points to a missing file: {}", CONFIG_FILE_ENV, path.display());
    }

    let user_config = dirs::config_dir().map(|d| d.join("blossom").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/blossom/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("blossom"))
        .unwrap_or_else(|| PathBuf::from("./blossom_data"))
}

//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--store`, `--log-level`)
//! 2. Explicit `--config` file
//! 3. `$NOTETREE_CONFIG` environment variable (path to config file)
//! 4. Project-local `.notetree.toml` in the current working directory
//! 5. Global `~/.config/notetree/config.toml`
//! 6. Built-in defaults

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

// ── Section configs ──────────────────────────────────────────────────────────

/// Where the notes are stored.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON store file.
    pub path: Option<PathBuf>,
}

/// Structured logging settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether logging is enabled at all.
    pub enabled: Option<bool>,
    /// Log level: trace, debug, info, warn, error, off.
    pub level: Option<String>,
    /// Output format: "text" or "json".
    pub format: Option<String>,
    /// Per-module levels, e.g. `notetree::provider = "debug"`.
    pub modules: Option<BTreeMap<String, String>>,
}

/// Tree rendering settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Directories always listed first.
    pub dirs_first: Option<bool>,
}

/// Interactive feedback settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct UiConfig {
    /// How long a flashed node stays highlighted, in milliseconds.
    pub flash_ms: Option<u64>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub tree: TreeConfig,
    pub ui: UiConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";
/// Default log format.
pub const DEFAULT_LOG_FORMAT: &str = "text";
/// Default highlight duration in milliseconds.
pub const DEFAULT_FLASH_MS: u64 = 1000;
/// File name of the store inside the data directory.
pub const STORE_FILE_NAME: &str = "notes.json";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("NOTETREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".notetree.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("notetree").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            storage: StorageConfig {
                path: other.storage.path.clone().or(self.storage.path),
            },
            logging: LoggingConfig {
                enabled: other.logging.enabled.or(self.logging.enabled),
                level: other.logging.level.clone().or(self.logging.level),
                format: other.logging.format.clone().or(self.logging.format),
                modules: match (self.logging.modules, &other.logging.modules) {
                    (Some(mut base), Some(over)) => {
                        base.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
                        Some(base)
                    }
                    (base, None) => base,
                    (None, Some(over)) => Some(over.clone()),
                },
            },
            tree: TreeConfig {
                dirs_first: other.tree.dirs_first.or(self.tree.dirs_first),
            },
            ui: UiConfig {
                flash_ms: other.ui.flash_ms.or(self.ui.flash_ms),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that the highest-priority candidate merges last.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Path of the JSON store. Falls back to the platform data directory,
    /// then to the working directory.
    pub fn store_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.path {
            return path.clone();
        }
        match dirs::data_dir() {
            Some(data) => data.join("notetree").join(STORE_FILE_NAME),
            None => PathBuf::from(STORE_FILE_NAME),
        }
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging.enabled.unwrap_or(true)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_format(&self) -> &str {
        self.logging.format.as_deref().unwrap_or(DEFAULT_LOG_FORMAT)
    }

    /// Per-module log levels, empty when unset.
    pub fn log_modules(&self) -> BTreeMap<String, String> {
        self.logging.modules.clone().unwrap_or_default()
    }

    /// Whether directories are listed before files.
    pub fn dirs_first(&self) -> bool {
        self.tree.dirs_first.unwrap_or(true)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.ui.flash_ms.unwrap_or(DEFAULT_FLASH_MS))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

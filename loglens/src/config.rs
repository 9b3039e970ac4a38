use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Filtering configuration shared by the library and the CLI.
///
/// The configuration can be loaded from multiple locations in order of
/// precedence:
/// 1. Custom config file specified via `--config`
/// 2. Local `.loglens.yaml` in the current directory
/// 3. Global `$HOME/.config/loglens/config.yaml`
///
/// Example:
/// ```yaml
/// include_keywords: ["payment"]
/// exclude_keywords: ["healthcheck"]
/// levels: ["ERROR", "WARNING"]
/// pattern: "user_id=\\d+"
/// start_time: "2024-01-01 00:00:00"
/// end_time: "2024-01-02 00:00:00"
/// concurrency: 4
/// log_level: "info"
/// ```
///
/// CLI flags take precedence over config file values; the merging
/// behavior is defined in `merge_with_cli`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Keywords a line must contain at least one of (empty = no constraint)
    #[serde(default)]
    pub include_keywords: Vec<String>,

    /// Keywords that drop a line when present
    #[serde(default)]
    pub exclude_keywords: Vec<String>,

    /// Log levels a line must contain at least one of (empty = no constraint)
    #[serde(default)]
    pub levels: Vec<String>,

    /// Regex a surviving line must match
    #[serde(default)]
    pub pattern: Option<String>,

    /// Start of the time window, format `YYYY-MM-DD HH:MM:SS`.
    /// Only applied when `end_time` is also set.
    #[serde(default)]
    pub start_time: Option<String>,

    /// End of the time window, format `YYYY-MM-DD HH:MM:SS`
    #[serde(default)]
    pub end_time: Option<String>,

    /// Number of files read concurrently
    /// Defaults to number of CPU cores if not specified
    #[serde(default)]
    pub concurrency: Option<NonZeroUsize>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_concurrency() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            levels: Vec::new(),
            pattern: None,
            start_time: None,
            end_time: None,
            concurrency: None,
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// The concurrency to scan with: the configured value, or the number
    /// of CPU cores when none was set
    pub fn concurrency(&self) -> NonZeroUsize {
        self.concurrency.unwrap_or_else(default_concurrency)
    }

    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Default config locations, best-effort
        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("loglens/config.yaml")),
            // Local config
            Some(PathBuf::from(".loglens.yaml")),
        ];

        // Add existing config files
        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested config file must exist; a missing path
        // here is an error rather than a silent skip
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        // Build and deserialize
        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli_config: ScanConfig) -> Self {
        // CLI values take precedence over config file values
        if !cli_config.include_keywords.is_empty() {
            self.include_keywords = cli_config.include_keywords;
        }
        if !cli_config.exclude_keywords.is_empty() {
            self.exclude_keywords = cli_config.exclude_keywords;
        }
        if !cli_config.levels.is_empty() {
            self.levels = cli_config.levels;
        }
        if cli_config.pattern.is_some() {
            self.pattern = cli_config.pattern;
        }
        if cli_config.start_time.is_some() {
            self.start_time = cli_config.start_time;
        }
        if cli_config.end_time.is_some() {
            self.end_time = cli_config.end_time;
        }
        if cli_config.concurrency.is_some() {
            self.concurrency = cli_config.concurrency;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        self
    }
}

//! Configuration loading for the history importer.
//!
//! Layered config: defaults -> default config file -> CLI config file ->
//! env vars (`HISTORY_*`) -> CLI flags (applied by the caller).
//! The default config file lives at `~/.config/history-importer/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SettingsError;

/// One connected engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Alias written into every document as its data source
    pub alias: String,

    /// Tenant assigned to records that carry none
    #[serde(default)]
    pub default_tenant_id: Option<String>,

    /// Skip this engine entirely when false
    #[serde(default = "default_import_enabled")]
    pub import_enabled: bool,
}

fn default_import_enabled() -> bool {
    true
}

impl EngineSettings {
    /// Create enabled engine settings without a default tenant.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            default_tenant_id: None,
            import_enabled: true,
        }
    }

    /// Set the default tenant.
    pub fn with_default_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.default_tenant_id = Some(tenant_id.into());
        self
    }
}

fn default_engines() -> Vec<EngineSettings> {
    vec![EngineSettings::new(default_engine_alias())]
}

fn default_engine_alias() -> String {
    "camunda-bpm".to_string()
}

/// Import pipeline tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Capacity of each job executor's bounded queue
    #[serde(default = "default_job_queue_size")]
    pub job_queue_size: usize,

    /// Maximum number of records per page
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Emit the re-serialized JSON of object variables as an Object entry
    #[serde(default = "default_include_object_variable_value")]
    pub include_object_variable_value: bool,

    /// Flattened string values longer than this (in chars) are truncated
    #[serde(default = "default_max_string_variable_length")]
    pub max_string_variable_length: usize,
}

fn default_job_queue_size() -> usize {
    100
}

fn default_max_page_size() -> usize {
    10_000
}

fn default_include_object_variable_value() -> bool {
    true
}

fn default_max_string_variable_length() -> usize {
    8191
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            job_queue_size: default_job_queue_size(),
            max_page_size: default_max_page_size(),
            include_object_variable_value: default_include_object_variable_value(),
            max_string_variable_length: default_max_string_variable_length(),
        }
    }
}

impl ImportSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("import.job_queue_size", self.job_queue_size),
            ("import.max_page_size", self.max_page_size),
            (
                "import.max_string_variable_length",
                self.max_string_variable_length,
            ),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(SettingsError::Invalid {
                    field,
                    reason: "must be > 0".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Engines to import from
    #[serde(default = "default_engines")]
    pub engines: Vec<EngineSettings>,

    /// Import pipeline settings
    #[serde(default)]
    pub import: ImportSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            engines: default_engines(),
            import: ImportSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/history-importer/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (HISTORY_*, nested with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SettingsError> {
        let config_dir = ProjectDirs::from("", "", "history-importer")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())?
            .set_default("import.job_queue_size", default_job_queue_size() as i64)?
            .set_default("import.max_page_size", default_max_page_size() as i64)?
            .set_default(
                "import.include_object_variable_value",
                default_include_object_variable_value(),
            )?
            .set_default(
                "import.max_string_variable_length",
                default_max_string_variable_length() as i64,
            )?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: HISTORY_LOG_LEVEL, HISTORY_IMPORT__JOB_QUEUE_SIZE, ...
        builder = builder.add_source(
            Environment::with_prefix("HISTORY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.engines.is_empty() {
            return Err(SettingsError::Invalid {
                field: "engines",
                reason: "at least one engine is required".to_string(),
            });
        }
        if let Some(engine) = self.engines.iter().find(|e| e.alias.trim().is_empty()) {
            return Err(SettingsError::Invalid {
                field: "engines.alias",
                reason: format!("empty alias in {engine:?}"),
            });
        }
        self.import.validate()
    }

    /// Look up an engine by alias.
    pub fn engine(&self, alias: &str) -> Option<&EngineSettings> {
        self.engines.iter().find(|e| e.alias == alias)
    }

    /// Engines with import enabled.
    pub fn enabled_engines(&self) -> impl Iterator<Item = &EngineSettings> {
        self.engines.iter().filter(|e| e.import_enabled)
    }
}

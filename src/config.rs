/// Application settings
///
/// Loaded once at startup from three layers, later ones winning:
/// built-in defaults, an optional TOML file, then `ROBOFLOW_*` environment
/// variables. Empty environment values count as unset.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::ConfigError;

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_VAR: &str = "LEAF_DOCTOR_CONFIG";

const ENV_MODEL: &str = "ROBOFLOW_MODEL";
const ENV_VERSION: &str = "ROBOFLOW_VERSION";
const ENV_API_KEY: &str = "ROBOFLOW_API_KEY";
const ENV_TASK: &str = "ROBOFLOW_TASK";
const ENV_URL: &str = "ROBOFLOW_URL";
const ENV_TIMEOUT: &str = "ROBOFLOW_TIMEOUT_SECS";

/// Which hosted inference endpoint to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTask {
    #[default]
    Classification,
    Detection,
}

impl ServiceTask {
    /// Hosted API base URL for this task
    pub fn base_url(self) -> &'static str {
        match self {
            ServiceTask::Classification => "https://classify.roboflow.com",
            ServiceTask::Detection => "https://detect.roboflow.com",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_lowercase().as_str() {
            "classification" | "classify" => Ok(ServiceTask::Classification),
            "detection" | "detect" => Ok(ServiceTask::Detection),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_TASK,
                value: value.to_string(),
            }),
        }
    }
}

/// Everything the classification client needs
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// "<workspace>/<project>"
    pub model_id: String,
    pub model_version: String,
    /// Empty disables classification
    pub api_key: String,
    pub task: ServiceTask,
    /// Replaces the task's hosted base URL when set
    pub service_url: Option<String>,
    /// 0 waits forever
    pub request_timeout_secs: u64,
    /// Detection only, percent (0-100)
    pub confidence: u8,
    /// Detection only, percent (0-100)
    pub overlap: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_id: "your-workspace/your-model".to_string(),
            model_version: "1".to_string(),
            api_key: String::new(),
            task: ServiceTask::Classification,
            service_url: None,
            request_timeout_secs: 60,
            confidence: 40,
            overlap: 45,
        }
    }
}

/// Partial settings as written in the TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    model_id: Option<String>,
    model_version: Option<String>,
    api_key: Option<String>,
    task: Option<ServiceTask>,
    service_url: Option<String>,
    request_timeout_secs: Option<u64>,
    confidence: Option<u8>,
    overlap: Option<u8>,
}

impl SettingsFile {
    /// Parse TOML text; `origin` names the source in errors
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: origin.to_string(),
            source,
        })
    }
}

impl Settings {
    /// Load settings from the process environment and the config file.
    /// Only an unreadable or malformed file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let path = env
            .get(CONFIG_PATH_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(default_config_path);

        let file = match path {
            Some(path) => read_config_file(&path)?,
            None => None,
        };

        Ok(Self::from_sources(file, &env))
    }

    /// Defaults only overlaid with environment variables
    pub fn from_env() -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_sources(None, &env)
    }

    /// Layer a parsed file and an environment map over the defaults.
    /// Invalid values are logged and skipped; every other field still applies.
    pub fn from_sources(file: Option<SettingsFile>, env: &HashMap<String, String>) -> Self {
        let mut settings = Settings::default();
        if let Some(file) = file {
            settings.apply_file(file);
        }
        settings.apply_env(env);
        settings.sanitize();
        settings
    }

    /// Whether a credential is configured
    pub fn has_credential(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        self.service_url
            .as_deref()
            .unwrap_or_else(|| self.task.base_url())
            .trim_end_matches('/')
    }

    fn apply_file(&mut self, file: SettingsFile) {
        if let Some(model_id) = file.model_id {
            self.model_id = model_id;
        }
        if let Some(model_version) = file.model_version {
            self.model_version = model_version;
        }
        if let Some(api_key) = file.api_key {
            self.api_key = api_key;
        }
        if let Some(task) = file.task {
            self.task = task;
        }
        if file.service_url.is_some() {
            self.service_url = file.service_url;
        }
        if let Some(timeout) = file.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(confidence) = file.confidence {
            self.confidence = confidence;
        }
        if let Some(overlap) = file.overlap {
            self.overlap = overlap;
        }
    }

    fn apply_env(&mut self, env: &HashMap<String, String>) {
        let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(model_id) = get(ENV_MODEL) {
            self.model_id = model_id.to_string();
        }
        if let Some(version) = get(ENV_VERSION) {
            self.model_version = version.to_string();
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            self.api_key = api_key.to_string();
        }
        if let Some(task) = get(ENV_TASK) {
            match ServiceTask::parse(task) {
                Ok(task) => self.task = task,
                Err(err) => skipped(err),
            }
        }
        if let Some(url) = get(ENV_URL) {
            self.service_url = Some(url.to_string());
        }
        if let Some(timeout) = get(ENV_TIMEOUT) {
            match timeout.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => skipped(ConfigError::InvalidValue {
                    key: ENV_TIMEOUT,
                    value: timeout.to_string(),
                }),
            }
        }
    }

    /// Put out-of-range fields back to their defaults
    fn sanitize(&mut self) {
        let defaults = Settings::default();

        if self.model_id.trim_matches('/').is_empty() {
            skipped(ConfigError::InvalidValue {
                key: "model_id",
                value: std::mem::replace(&mut self.model_id, defaults.model_id),
            });
        }
        if self.model_version.is_empty() || self.model_version.contains('/') {
            skipped(ConfigError::InvalidValue {
                key: "model_version",
                value: std::mem::replace(&mut self.model_version, defaults.model_version),
            });
        }
        if self.confidence > 100 {
            skipped(ConfigError::InvalidValue {
                key: "confidence",
                value: std::mem::replace(&mut self.confidence, defaults.confidence).to_string(),
            });
        }
        if self.overlap > 100 {
            skipped(ConfigError::InvalidValue {
                key: "overlap",
                value: std::mem::replace(&mut self.overlap, defaults.overlap).to_string(),
            });
        }
    }
}

fn skipped(err: ConfigError) {
    warn!("⚠️  {}. Keeping the default.", err);
}

/// ~/.config/leaf-doctor/config.toml on Linux
fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
    path.push("leaf-doctor");
    path.push("config.toml");
    Some(path)
}

/// Read and parse the config file; a missing file is not an error
fn read_config_file(path: &Path) -> Result<Option<SettingsFile>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            info!("📁 Loading settings from {}", path.display());
            SettingsFile::parse(&text, &path.display().to_string()).map(Some)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

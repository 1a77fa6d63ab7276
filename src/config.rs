use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CorepError, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// What to do when the recovered payload lacks a registered field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Leave the field unset and let validation report on it.
    #[default]
    Lenient,
    /// Abort the run with [`CorepError::MissingField`].
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub model: String,
    /// Upper bound on a single generation call. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// Extra attempts after a transient generation failure.
    pub max_retries: u32,
    pub missing_field_policy: MissingFieldPolicy,
    pub json_mode: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: None,
            max_retries: 0,
            missing_field_policy: MissingFieldPolicy::Lenient,
            json_mode: false,
        }
    }
}

impl ExtractorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CorepError::Config(format!("Invalid TOML config: {}", e)))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a `.toml` or `.json` file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        debug!("Loading extractor config from {}", path.display());

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(CorepError::Config(format!(
                "Unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Override settings from `COREP_MODEL`, `COREP_TIMEOUT_SECS` and
    /// `COREP_MAX_RETRIES` when set.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(model) = lookup("COREP_MODEL") {
            self.model = model;
        }
        if let Some(raw) = lookup("COREP_TIMEOUT_SECS") {
            let secs = raw.parse().map_err(|_| {
                CorepError::Config(format!("COREP_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            self.timeout_secs = Some(secs);
        }
        if let Some(raw) = lookup("COREP_MAX_RETRIES") {
            self.max_retries = raw.parse().map_err(|_| {
                CorepError::Config(format!("COREP_MAX_RETRIES is not a number: {}", raw))
            })?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ExtractorConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout(), None);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.missing_field_policy, MissingFieldPolicy::Lenient);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExtractorConfig::from_toml_str(
            "timeout_secs = 30\nmissing_field_policy = \"strict\"\n",
        )
        .unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.missing_field_policy, MissingFieldPolicy::Strict);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = ExtractorConfig::from_toml_str("max_retries = \"many\"");
        assert!(matches!(result, Err(CorepError::Config(_))));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"model": "gemini-2.5-pro", "max_retries": 2}}"#).unwrap();

        let config = ExtractorConfig::load(file.path()).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            ExtractorConfig::load(file.path()),
            Err(CorepError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("COREP_MODEL", "gemini-2.5-pro"),
            ("COREP_TIMEOUT_SECS", "45"),
            ("COREP_MAX_RETRIES", "3"),
        ]
        .into_iter()
        .collect();

        let config = ExtractorConfig::default()
            .apply_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.timeout_secs, Some(45));
        assert_eq!(config.max_retries, 3);

        let bad = ExtractorConfig::default()
            .apply_vars(|k| (k == "COREP_MAX_RETRIES").then(|| "lots".to_string()));
        assert!(matches!(bad, Err(CorepError::Config(_))));
    }
}

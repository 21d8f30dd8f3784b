//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub scenarios_dir: PathBuf,
    pub progress_dir: PathBuf,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub summary_model: String,
    pub stt_model: String,
    pub stt_language: String,
    pub tts_voice: String,
    pub cors_origin: String,
    pub max_upload_bytes: usize,
    pub seed_sample_scenarios: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");

        let max_upload_str = var_or("MAX_UPLOAD_BYTES", "10485760");
        let max_upload_bytes = max_upload_str.parse::<usize>().map_err(|e| {
            ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string(), e.to_string())
        })?;

        // --- Storage Settings ---
        let data_dir = PathBuf::from(var_or("DATA_DIR", "./data"));
        let scenarios_dir = lookup("SCENARIOS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("scenarios"));
        let progress_dir = lookup("PROGRESS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("progress"));

        let seed_str = var_or("SEED_SAMPLE_SCENARIOS", "true");
        let seed_sample_scenarios = match seed_str.to_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "SEED_SAMPLE_SCENARIOS".to_string(),
                    format!("'{}' is not a boolean", seed_str),
                ))
            }
        };

        // --- Load API Keys (as optional) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());

        // --- Load Adapter-specific Settings ---
        let chat_model = var_or("CHAT_MODEL", "gpt-4o-mini");
        let summary_model = var_or("SUMMARY_MODEL", "gpt-4o");
        let stt_model = var_or("STT_MODEL", "whisper-1");
        let stt_language = var_or("STT_LANGUAGE", "en");
        let tts_voice = var_or("TTS_VOICE", "alloy");

        Ok(Self {
            bind_address,
            log_level,
            scenarios_dir,
            progress_dir,
            openai_api_key,
            chat_model,
            summary_model,
            stt_model,
            stt_language,
            tts_voice,
            cors_origin,
            max_upload_bytes,
            seed_sample_scenarios,
        })
    }

    /// The API key, for binaries that cannot run without the provider.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.scenarios_dir, PathBuf::from("./data/scenarios"));
        assert_eq!(config.progress_dir, PathBuf::from("./data/progress"));
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.stt_language, "en");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.seed_sample_scenarios);
        assert!(config.openai_api_key.is_none());
        assert!(config.require_openai_api_key().is_err());
    }

    #[test]
    fn explicit_directories_override_data_dir() {
        let config = config_from(&[
            ("DATA_DIR", "/var/tutor"),
            ("PROGRESS_DIR", "/tmp/progress"),
            ("SEED_SAMPLE_SCENARIOS", "no"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(config.scenarios_dir, PathBuf::from("/var/tutor/scenarios"));
        assert_eq!(config.progress_dir, PathBuf::from("/tmp/progress"));
        assert!(!config.seed_sample_scenarios);
        assert_eq!(config.require_openai_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn invalid_values_are_reported_by_name() {
        for (key, value) in [
            ("BIND_ADDRESS", "not-an-address"),
            ("RUST_LOG", "loud"),
            ("MAX_UPLOAD_BYTES", "lots"),
            ("SEED_SAMPLE_SCENARIOS", "maybe"),
        ] {
            match config_from(&[(key, value)]) {
                Err(ConfigError::InvalidValue(name, _)) => assert_eq!(name, key),
                other => panic!("expected InvalidValue for {key}, got {other:?}"),
            }
        }
    }
}

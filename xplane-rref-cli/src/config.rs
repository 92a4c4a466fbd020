//! Configuration file loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use xplane_rref::ClientConfig;

/// Application configuration (loaded from a TOML file)
///
/// ```toml
/// [client]
/// sim_host = "192.168.1.20"
/// local_port = 19191
///
/// [output]
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("frequency_hz must be positive, got {0}")]
    InvalidFrequency(i32),

    #[error("receive_timeout_ms must be greater than zero")]
    ZeroReceiveTimeout,

    #[error("receive_buffer_size must hold at least one record, got {0}")]
    BufferTooSmall(usize),

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    #[error("dataref path '{0}' does not fit the 400-byte name field")]
    PathTooLong(String),
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate(&config.client).with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Reject values the session or dispatcher cannot work with
pub fn validate(client: &ClientConfig) -> std::result::Result<(), ConfigError> {
    if client.frequency_hz <= 0 {
        return Err(ConfigError::InvalidFrequency(client.frequency_hz));
    }
    if client.receive_timeout_ms == 0 {
        return Err(ConfigError::ZeroReceiveTimeout);
    }
    if client.receive_buffer_size < 13 {
        return Err(ConfigError::BufferTooSmall(client.receive_buffer_size));
    }
    if !client.light_threshold.is_finite() {
        return Err(ConfigError::NotFinite("light_threshold"));
    }
    if !client.gear_delta.is_finite() {
        return Err(ConfigError::NotFinite("gear_delta"));
    }

    // Longest subscript appended by the scheduler is "[100]"
    for path in [&client.lights_path, &client.gear_path] {
        if path.len() + 5 > xplane_rref::codec::NAME_FIELD_LEN {
            return Err(ConfigError::PathTooLong(path.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [client]
            sim_host = "192.168.1.20"
            local_port = 20000
            unsubscribe_on_stop = true

            [output]
            format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.client.sim_host, "192.168.1.20");
        assert_eq!(config.client.sim_port, 49001);
        assert_eq!(config.client.local_port, 20000);
        assert!(config.client.unsubscribe_on_stop);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.client, ClientConfig::default());
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client]\ngear_path = \"sim/aircraft/parts/acf_gear_deploy\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.client.gear_path, "sim/aircraft/parts/acf_gear_deploy");
        assert_eq!(config.client.lights_path, xplane_rref::config::DEFAULT_LIGHTS_PATH);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client]\nfrequency_hz = 0").unwrap();
        assert!(load_config(file.path()).is_err());

        assert!(load_config(Path::new("does-not-exist.toml")).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(validate(&ClientConfig::default()).is_ok());

        let mut client = ClientConfig::default();
        client.receive_timeout_ms = 0;
        assert!(matches!(validate(&client), Err(ConfigError::ZeroReceiveTimeout)));

        let mut client = ClientConfig::default();
        client.lights_path = "x".repeat(396);
        assert!(matches!(validate(&client), Err(ConfigError::PathTooLong(_))));
    }
}

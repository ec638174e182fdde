//! Configuration loader and validator for the Fathom→Pipedrive bridge.
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub server: Server,
    pub pipedrive: Pipedrive,
    pub filter: Filter,
    pub logs: Logs,
}

/// Inbound webhook server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub bind_addr: String,
    pub webhook_token: String,
}

/// Pipedrive API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pipedrive {
    pub company_domain: String,
    pub api_token: String,
}

/// Attendee filtering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Filter {
    /// Attendees whose email contains this substring are skipped entirely.
    pub excluded_domain: String,
}

/// Durable log locations, relative to `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Logs {
    pub data_dir: String,
    pub raw_log_file: String,
    pub audit_log_file: String,
}

impl Config {
    /// Ensure required directories exist (creates `logs.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.logs.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.logs.data_dir)
    }

    pub fn raw_log_path(&self) -> PathBuf {
        Path::new(&self.logs.data_dir).join(&self.logs.raw_log_file)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        Path::new(&self.logs.data_dir).join(&self.logs.audit_log_file)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.server.bind_addr.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Invalid(
            "server.bind_addr must be a valid socket address",
        ));
    }
    if cfg.server.webhook_token.trim().is_empty() {
        return Err(ConfigError::Invalid("server.webhook_token must be non-empty"));
    }

    if cfg.pipedrive.company_domain.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "pipedrive.company_domain must be non-empty",
        ));
    }
    if !cfg
        .pipedrive
        .company_domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Invalid(
            "pipedrive.company_domain must be a bare subdomain (letters, digits, hyphen)",
        ));
    }
    if cfg.pipedrive.api_token.trim().is_empty() {
        return Err(ConfigError::Invalid("pipedrive.api_token must be non-empty"));
    }

    if cfg.filter.excluded_domain.trim().is_empty() {
        return Err(ConfigError::Invalid("filter.excluded_domain must be non-empty"));
    }

    if cfg.logs.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("logs.data_dir must be non-empty"));
    }
    if cfg.logs.raw_log_file.trim().is_empty() {
        return Err(ConfigError::Invalid("logs.raw_log_file must be non-empty"));
    }
    if cfg.logs.audit_log_file.trim().is_empty() {
        return Err(ConfigError::Invalid("logs.audit_log_file must be non-empty"));
    }

    Ok(())
}

/// Example YAML configuration, usable as a starting point.
pub fn example() -> &'static str {
    r#"server:
  bind_addr: "0.0.0.0:5000"
  webhook_token: "CHANGE_ME"

pipedrive:
  company_domain: "yourcompany"
  api_token: "YOUR_PIPEDRIVE_API_TOKEN"

filter:
  excluded_domain: "@yourcompany.com"

logs:
  data_dir: "./data"
  raw_log_file: "fathom_meeting_log.jsonl"
  audit_log_file: "attendee_audit_log.csv"
"#
}

//! Typed configuration, loaded from YAML (mirrors `OneAuth.yaml` /
//! `config.go`'s `Config`). Config file parsing itself is in scope here —
//! spec.md §1 only excludes *validation semantics beyond the shape below*
//! from the core's concern, but the crate still needs a concrete type to
//! hand the core, so it lives here rather than being left abstract.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_path")]
    pub path: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_path() -> String {
    "log/orgsync.log".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            path: default_log_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SotConfig {
    pub host: String,
    pub port: u16,
    pub app_key: String,
    pub app_secret: String,
    #[serde(default = "default_true")]
    pub tls: bool,
    /// "HH:MM:SS" offset from midnight at which the daily cycle fires.
    #[serde(default)]
    pub read_interval: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub token: String,
    pub host: String,
    pub port: u16,
    #[serde(default = "default_true")]
    pub tls: bool,
    pub root_name: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub codes: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    pub sot: SotConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub default_tree: Option<String>,
    #[serde(default)]
    pub sub_tree_selection: Option<String>,
}

fn default_concurrency() -> usize {
    10
}

impl AgentConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<AgentConfig, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: AgentConfig = serde_yaml::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Mirrors `ConfigCheck()`: every required field must be non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.token.is_empty() {
            return Err(ConfigError::MissingField("target.token"));
        }
        if self.sot.host.is_empty() {
            return Err(ConfigError::MissingField("sot.host"));
        }
        if self.target.host.is_empty() {
            return Err(ConfigError::MissingField("target.host"));
        }
        if self.target.root_name.is_empty() {
            return Err(ConfigError::MissingField("target.root_name"));
        }
        if self.sot.app_key.is_empty() || self.sot.app_secret.is_empty() {
            return Err(ConfigError::MissingField("sot.app_key/app_secret"));
        }
        Ok(())
    }

    pub fn sot_base_url(&self) -> String {
        let scheme = if self.sot.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.sot.host, self.sot.port)
    }

    pub fn target_base_url(&self) -> String {
        let scheme = if self.target.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.target.host, self.target.port)
    }

    /// Union of configured codes and names, used by forest reconstruction
    /// to mark nodes as filtered (spec.md §3 / §4.4).
    pub fn filter_set(&self) -> std::collections::HashSet<String> {
        self.filter
            .codes
            .iter()
            .chain(self.filter.names.iter())
            .cloned()
            .collect()
    }
}

/// Parse a `"HH:MM:SS"` offset into seconds past midnight, as
/// `timer.go`'s `TimeToSec` does. An empty string means "midnight".
pub fn parse_daily_offset(offset: &str) -> u32 {
    if offset.is_empty() {
        return 0;
    }
    let parts: Vec<&str> = offset.split(':').collect();
    if parts.len() != 3 {
        return 0;
    }
    let hour: u32 = parts[0].parse().unwrap_or(0);
    let minute: u32 = parts[1].parse().unwrap_or(0);
    let second: u32 = parts[2].parse().unwrap_or(0);
    hour * 3600 + minute * 60 + second
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hh_mm_ss_offset() {
        assert_eq!(parse_daily_offset("01:30:00"), 5400);
        assert_eq!(parse_daily_offset(""), 0);
        assert_eq!(parse_daily_offset("garbage"), 0);
    }

    #[test]
    fn validate_rejects_missing_token() {
        let config = AgentConfig {
            log: LogConfig::default(),
            concurrency: 10,
            sot: SotConfig {
                host: "sot.example.com".into(),
                port: 443,
                app_key: "k".into(),
                app_secret: "s".into(),
                tls: true,
                read_interval: String::new(),
            },
            target: TargetConfig {
                token: String::new(),
                host: "target.example.com".into(),
                port: 443,
                tls: true,
                root_name: "Acme".into(),
            },
            filter: FilterConfig::default(),
            default_tree: None,
            sub_tree_selection: None,
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("target.token")));
    }
}

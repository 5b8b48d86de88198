//! Error taxonomy (spec.md §7): four operational categories plus config
//! validation, which aborts the process before any cycle runs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config field: {0}")]
    MissingField(&'static str),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Errors surfaced by a sync cycle. Each variant maps to a handling policy
/// in spec.md §7; `AgentError` itself carries no retry behavior — callers
/// (the cycle orchestrator, the executors) decide what to do with it.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("SoT unavailable: {0}")]
    SoTUnavailable(#[from] reqwest::Error),

    #[error("SoT returned a malformed response: {0}")]
    SoTMalformed(String),

    #[error("target transient failure (status {status:?}): {source}")]
    TargetTransient {
        status: Option<u16>,
        source: String,
    },

    #[error("target rejected request (status {status}): {body}")]
    TargetRejected { status: u16, body: String },
}

pub type AgentResult<T> = Result<T, AgentError>;

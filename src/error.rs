use std::process::ExitStatus;

use thiserror::Error;

/// Failure of one external query tool invocation.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Malformed output from {program}: {source}")]
    Decode {
        program: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Query cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Could not enumerate schedulers: {0}")]
    PoolQuery(#[source] QueryError),

    #[error("Could not obtain credential for group {group}: {reason}")]
    Credential { group: String, reason: String },

    #[error("Query against scheduler {endpoint} failed: {source}")]
    SchedulerQuery {
        endpoint: String,
        #[source]
        source: QueryError,
    },

    #[error("Unsupported type {kind} for attribute {attribute}; supported types are string, undefined")]
    UnsupportedAttributeType { attribute: String, kind: String },

    #[error("Discovery cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiscoveryError {
    /// Wrap a coordinator failure, keeping cancellation distinct.
    pub fn pool(err: QueryError) -> Self {
        match err {
            QueryError::Cancelled => DiscoveryError::Cancelled,
            other => DiscoveryError::PoolQuery(other),
        }
    }

    /// Wrap a per-scheduler failure, keeping cancellation distinct.
    pub fn scheduler(endpoint: impl Into<String>, err: QueryError) -> Self {
        match err {
            QueryError::Cancelled => DiscoveryError::Cancelled,
            source => DiscoveryError::SchedulerQuery {
                endpoint: endpoint.into(),
                source,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

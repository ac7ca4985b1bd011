use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::condor::CondorCommand;
use crate::config::DiscoveryConfig;
use crate::error::QueryError;
use crate::record::JobRecord;

/// Queries against the scheduler pool.
///
/// This is the seam between discovery and whatever actually talks to the
/// pool; tests plug in scripted implementations.
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    /// Ask the pool coordinator for scheduler daemons matching `constraint`,
    /// projecting `attribute`.
    async fn list_schedulers(
        &self,
        constraint: &str,
        attribute: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobRecord>, QueryError>;

    /// Ask one scheduler for its job records matching `constraint`,
    /// projecting `attribute`.
    async fn list_jobs(
        &self,
        scheduler: &str,
        constraint: &str,
        attribute: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobRecord>, QueryError>;
}

/// [`ClusterQuery`] backed by the `condor_status` and `condor_q` tools.
#[derive(Debug, Clone)]
pub struct CondorClient {
    condor_status: PathBuf,
    condor_q: PathBuf,
}

impl CondorClient {
    pub fn new(condor_status: impl Into<PathBuf>, condor_q: impl Into<PathBuf>) -> Self {
        Self {
            condor_status: condor_status.into(),
            condor_q: condor_q.into(),
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.condor_status.clone(), config.condor_q.clone())
    }
}

#[async_trait]
impl ClusterQuery for CondorClient {
    async fn list_schedulers(
        &self,
        constraint: &str,
        attribute: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobRecord>, QueryError> {
        CondorCommand::new(&self.condor_status)
            .with_arg("-schedd")
            .with_constraint(constraint)
            .with_attribute(attribute)
            .run(cancel)
            .await
    }

    async fn list_jobs(
        &self,
        scheduler: &str,
        constraint: &str,
        attribute: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobRecord>, QueryError> {
        CondorCommand::new(&self.condor_q)
            .with_name(scheduler)
            .with_constraint(constraint)
            .with_attribute(attribute)
            .run(cancel)
            .await
    }
}

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::condor::ClusterQuery;
use crate::error::{DiscoveryError, Result};

/// Attribute holding a scheduler daemon's name in coordinator records.
pub const SCHEDULER_NAME_ATTRIBUTE: &str = "Name";

/// Name of one scheduler daemon, as the pool coordinator reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchedulerEndpoint(String);

impl SchedulerEndpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchedulerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// List the schedulers matching `constraint`.
///
/// # Errors
///
/// [`DiscoveryError::PoolQuery`] if the coordinator query fails, or
/// [`DiscoveryError::Cancelled`] if `cancel` fires first. Either is fatal to
/// the run.
pub async fn enumerate(
    query: &dyn ClusterQuery,
    constraint: &str,
    cancel: &CancellationToken,
) -> Result<Vec<SchedulerEndpoint>> {
    let records = query
        .list_schedulers(constraint, SCHEDULER_NAME_ATTRIBUTE, cancel)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, constraint, "Could not get schedulers to find active files on");
            DiscoveryError::pool(e)
        })?;

    let mut endpoints = Vec::with_capacity(records.len());
    for record in &records {
        match record.string_attr(SCHEDULER_NAME_ATTRIBUTE) {
            Ok(Some(name)) => endpoints.push(SchedulerEndpoint::new(name)),
            Ok(None) => {
                tracing::warn!("Scheduler record without a name, skipping");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Scheduler record with unusable name, skipping");
            }
        }
    }

    tracing::info!(count = endpoints.len(), "Enumerated schedulers");
    Ok(endpoints)
}

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::condor::ClusterQuery;
use crate::config::DiscoveryConfig;
use crate::discovery::aggregator::aggregate_group;
use crate::discovery::enumerator::enumerate;
use crate::discovery::{GroupFileSet, SchedulerEndpoint};
use crate::error::{DiscoveryError, Result};
use crate::token::TokenProvisioner;

/// Active files of one group together with the storage area they live in.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub storage_area: String,
    pub files: GroupFileSet,
}

/// Outcome of a discovery pass: group name to its active files.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryResult {
    pub collected_at: DateTime<Utc>,
    pub groups: BTreeMap<String, GroupReport>,
}

impl DiscoveryResult {
    pub fn files(&self, group: &str) -> Option<&GroupFileSet> {
        self.groups.get(group).map(|report| &report.files)
    }
}

/// Runs discovery for every configured group.
pub struct Driver {
    config: DiscoveryConfig,
    query: Arc<dyn ClusterQuery>,
    tokens: Arc<dyn TokenProvisioner>,
}

impl Driver {
    pub fn new(
        config: DiscoveryConfig,
        query: Arc<dyn ClusterQuery>,
        tokens: Arc<dyn TokenProvisioner>,
    ) -> Self {
        Self {
            config,
            query,
            tokens,
        }
    }

    /// Run one discovery pass.
    ///
    /// Schedulers are enumerated once and shared by all groups. Groups run one
    /// after another; each group's set is stored only after its aggregation
    /// has fully finished. Credential and per-scheduler failures are logged
    /// and the pass carries on with what it can still collect.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::PoolQuery`] if the schedulers can't be
    /// enumerated and [`DiscoveryError::Cancelled`] if `cancel` fires before a
    /// group starts or cuts short one of its scheduler queries. A pass whose
    /// queries all completed is returned even if `cancel` fires afterwards.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<DiscoveryResult> {
        let collected_at = Utc::now();

        let endpoints: Arc<[SchedulerEndpoint]> =
            enumerate(self.query.as_ref(), &self.config.schedd_constraint, cancel)
                .await?
                .into();
        if endpoints.is_empty() {
            tracing::warn!(
                constraint = %self.config.schedd_constraint,
                "No schedulers matched; every group will report no active files"
            );
        }

        let attrs = Arc::new(self.config.job_attributes());
        let mut groups = BTreeMap::new();

        for group in &self.config.groups {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }

            match self.tokens.provision(group, cancel).await {
                Ok(()) => {}
                Err(DiscoveryError::Cancelled) => return Err(DiscoveryError::Cancelled),
                Err(e) => {
                    tracing::error!(group = %group, error = %e, "Could not get bearer token");
                }
            }

            let aggregation = aggregate_group(
                self.query.clone(),
                attrs.clone(),
                group,
                endpoints.clone(),
                cancel,
            )
            .await;
            if aggregation.cancelled_endpoints > 0 {
                tracing::warn!(
                    group = %group,
                    cancelled = aggregation.cancelled_endpoints,
                    "Discovery cancelled while querying schedulers"
                );
                return Err(DiscoveryError::Cancelled);
            }

            groups.insert(
                group.clone(),
                GroupReport {
                    storage_area: self.config.storage_area(group),
                    files: aggregation.files,
                },
            );
        }

        Ok(DiscoveryResult {
            collected_at,
            groups,
        })
    }
}

//! Test harness for discovery tests.
//!
//! Provides a scripted scheduler pool and credential fakes so discovery can be
//! exercised without the HTCondor tools.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use active_files::condor::ClusterQuery;
use active_files::config::DiscoveryConfig;
use active_files::discovery::extractor::group_constraint;
use active_files::discovery::GroupFileSet;
use active_files::error::{DiscoveryError, QueryError};
use active_files::record::{AttributeValue, JobRecord};
use active_files::token::TokenProvisioner;

pub const FILE_ATTRIBUTE: &str = "PNFS_INPUT_FILES";
pub const GROUP_ATTRIBUTE: &str = "Jobsub_Group";

/// How a scripted scheduler answers a job query.
#[derive(Debug, Clone)]
pub enum Reply {
    Records(Vec<JobRecord>),
    /// Transport-level failure, as if the scheduler were unreachable.
    Unreachable,
    /// Never answers; waits for cancellation.
    Hang,
    /// Answers with the records, but fires the pass's cancellation first, as
    /// if a signal arrived just as the last query finished.
    RecordsThenCancel(Vec<JobRecord>),
}

/// A recorded `list_jobs` call.
#[derive(Debug, Clone, PartialEq)]
pub struct JobQueryCall {
    pub scheduler: String,
    pub constraint: String,
    pub attribute: String,
}

/// Scripted [`ClusterQuery`].
///
/// Job replies are keyed by scheduler and group. Any scheduler/group pair
/// without a reply answers with no records.
pub struct FakeCluster {
    schedulers: Vec<String>,
    pool_records: Option<Vec<JobRecord>>,
    pool_fails: bool,
    replies: HashMap<(String, String), Reply>,
    pool_calls: Mutex<Vec<(String, String)>>,
    job_calls: Mutex<Vec<JobQueryCall>>,
}

impl FakeCluster {
    pub fn new<S: AsRef<str>>(schedulers: &[S]) -> Self {
        Self {
            schedulers: schedulers.iter().map(|s| s.as_ref().to_string()).collect(),
            pool_records: None,
            pool_fails: false,
            replies: HashMap::new(),
            pool_calls: Mutex::new(Vec::new()),
            job_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_pool() -> Self {
        let mut cluster = Self::new::<&str>(&[]);
        cluster.pool_fails = true;
        cluster
    }

    /// Coordinator answers with these raw records instead of one `Name`
    /// record per scheduler.
    pub fn with_pool_records(records: Vec<JobRecord>) -> Self {
        let mut cluster = Self::new::<&str>(&[]);
        cluster.pool_records = Some(records);
        cluster
    }

    pub fn reply(mut self, scheduler: &str, group: &str, reply: Reply) -> Self {
        self.replies.insert(
            (scheduler.to_string(), group_constraint(GROUP_ATTRIBUTE, group)),
            reply,
        );
        self
    }

    /// Shorthand for a scheduler whose jobs each carry one file attribute value.
    pub fn files(self, scheduler: &str, group: &str, values: &[&str]) -> Self {
        let records = values.iter().map(|v| files_record(v)).collect();
        self.reply(scheduler, group, Reply::Records(records))
    }

    pub fn pool_calls(&self) -> Vec<(String, String)> {
        self.pool_calls.lock().unwrap().clone()
    }

    pub fn job_calls(&self) -> Vec<JobQueryCall> {
        self.job_calls.lock().unwrap().clone()
    }
}

fn unreachable_error(scheduler: &str) -> QueryError {
    QueryError::Spawn {
        program: format!("condor_q -name {}", scheduler),
        source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
    }
}

#[async_trait]
impl ClusterQuery for FakeCluster {
    async fn list_schedulers(
        &self,
        constraint: &str,
        attribute: &str,
        _cancel: &CancellationToken,
    ) -> Result<Vec<JobRecord>, QueryError> {
        self.pool_calls
            .lock()
            .unwrap()
            .push((constraint.to_string(), attribute.to_string()));

        if self.pool_fails {
            return Err(unreachable_error("collector"));
        }

        if let Some(ref records) = self.pool_records {
            return Ok(records.clone());
        }

        Ok(self
            .schedulers
            .iter()
            .map(|name| JobRecord::new().with(attribute, AttributeValue::String(name.clone())))
            .collect())
    }

    async fn list_jobs(
        &self,
        scheduler: &str,
        constraint: &str,
        attribute: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobRecord>, QueryError> {
        self.job_calls.lock().unwrap().push(JobQueryCall {
            scheduler: scheduler.to_string(),
            constraint: constraint.to_string(),
            attribute: attribute.to_string(),
        });

        // Let the workers of a pass interleave.
        tokio::task::yield_now().await;

        match self
            .replies
            .get(&(scheduler.to_string(), constraint.to_string()))
        {
            None => Ok(Vec::new()),
            Some(Reply::Records(records)) => Ok(records.clone()),
            Some(Reply::Unreachable) => Err(unreachable_error(scheduler)),
            Some(Reply::Hang) => {
                cancel.cancelled().await;
                Err(QueryError::Cancelled)
            }
            Some(Reply::RecordsThenCancel(records)) => {
                cancel.cancel();
                Ok(records.clone())
            }
        }
    }
}

/// Credential fake that records which groups asked for a token.
#[derive(Default)]
pub struct RecordingTokens {
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, group: &str) -> Self {
        self.failing.insert(group.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenProvisioner for RecordingTokens {
    async fn provision(&self, group: &str, _cancel: &CancellationToken) -> active_files::error::Result<()> {
        self.calls.lock().unwrap().push(group.to_string());
        if self.failing.contains(group) {
            return Err(DiscoveryError::Credential {
                group: group.to_string(),
                reason: "htgettoken exited with exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Credential fake whose token request never completes until cancelled.
#[derive(Default)]
pub struct WaitingTokens {
    calls: Mutex<Vec<String>>,
}

impl WaitingTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenProvisioner for WaitingTokens {
    async fn provision(&self, group: &str, cancel: &CancellationToken) -> active_files::error::Result<()> {
        self.calls.lock().unwrap().push(group.to_string());
        cancel.cancelled().await;
        Err(DiscoveryError::Cancelled)
    }
}

/// Job record whose file attribute is the given string.
pub fn files_record(value: &str) -> JobRecord {
    JobRecord::new().with(FILE_ATTRIBUTE, AttributeValue::String(value.to_string()))
}

pub fn test_config(groups: &[&str]) -> DiscoveryConfig {
    DiscoveryConfig::default().with_groups(groups.iter().map(|g| g.to_string()).collect())
}

pub fn file_set(paths: &[&str]) -> GroupFileSet {
    paths.iter().map(|p| p.to_string()).collect()
}

/// Cancel `token` after `delay`.
pub fn cancel_after(token: &CancellationToken, delay: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        token.cancel();
    });
}

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::condor::ClusterQuery;
use crate::config::JobAttributes;
use crate::discovery::extractor::extract;
use crate::discovery::{FilePath, GroupFileSet, SchedulerEndpoint};
use crate::error::DiscoveryError;

/// Result of aggregating one group.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub files: GroupFileSet,
    /// Endpoints whose query was cut short by cancellation.
    pub cancelled_endpoints: usize,
}

/// Gather one group's active files from every scheduler.
///
/// See [`aggregate_group`]; endpoints cut short by cancellation simply
/// contribute nothing.
pub async fn aggregate(
    query: Arc<dyn ClusterQuery>,
    attrs: Arc<JobAttributes>,
    group: &str,
    endpoints: Arc<[SchedulerEndpoint]>,
    cancel: &CancellationToken,
) -> GroupFileSet {
    aggregate_group(query, attrs, group, endpoints, cancel)
        .await
        .files
}

/// Gather one group's active files, also reporting how many endpoints were
/// cancelled.
///
/// One worker task per endpoint runs the extractor and sends each path into a
/// single channel. A listener task owns the set and is its only writer.
/// Endpoints that fail are logged and contribute nothing.
///
/// The set is returned only after every worker has been joined, the channel
/// closed, and the listener has drained what was buffered.
pub async fn aggregate_group(
    query: Arc<dyn ClusterQuery>,
    attrs: Arc<JobAttributes>,
    group: &str,
    endpoints: Arc<[SchedulerEndpoint]>,
    cancel: &CancellationToken,
) -> Aggregation {
    let (tx, mut rx) = mpsc::unbounded_channel::<FilePath>();

    let listener = tokio::spawn(async move {
        let mut files = GroupFileSet::new();
        while let Some(path) = rx.recv().await {
            files.insert(path);
        }
        files
    });

    let mut workers = Vec::with_capacity(endpoints.len());
    for index in 0..endpoints.len() {
        let query = query.clone();
        let attrs = attrs.clone();
        let endpoints = endpoints.clone();
        let group = group.to_string();
        let cancel = cancel.clone();
        let tx = tx.clone();

        // Resolves to true when the endpoint's query was cancelled.
        let handle = tokio::spawn(async move {
            let endpoint = &endpoints[index];
            match extract(query.as_ref(), &attrs, &group, endpoint, &cancel).await {
                Ok(files) => {
                    for path in files {
                        if tx.send(path).is_err() {
                            tracing::warn!(group = %group, endpoint = %endpoint, "File listener gone, dropping results");
                            break;
                        }
                    }
                    false
                }
                Err(DiscoveryError::Cancelled) => {
                    tracing::debug!(group = %group, endpoint = %endpoint, "Active file query cancelled");
                    true
                }
                Err(e) => {
                    tracing::error!(
                        group = %group,
                        endpoint = %endpoint,
                        error = %e,
                        "Could not get active files"
                    );
                    false
                }
            }
        });
        workers.push((index, handle));
    }

    let mut cancelled_endpoints = 0;
    for (index, handle) in workers {
        match handle.await {
            Ok(true) => cancelled_endpoints += 1,
            Ok(false) => {}
            Err(e) => {
                let endpoint = &endpoints[index];
                tracing::error!(
                    group,
                    endpoint = %endpoint,
                    error = %e,
                    "File worker panicked"
                );
            }
        }
    }

    // Last sender: the listener stops once the buffered paths are drained.
    drop(tx);

    let files = match listener.await {
        Ok(files) => {
            tracing::info!(group, files = files.len(), "Aggregated active files");
            files
        }
        Err(e) => {
            tracing::error!(group, error = %e, "File listener panicked");
            GroupFileSet::new()
        }
    };

    Aggregation {
        files,
        cancelled_endpoints,
    }
}

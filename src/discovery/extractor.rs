use tokio_util::sync::CancellationToken;

use crate::condor::ClusterQuery;
use crate::config::JobAttributes;
use crate::discovery::{FilePath, SchedulerEndpoint};
use crate::error::{DiscoveryError, Result};
use crate::record::JobRecord;

/// Equality constraint selecting a group's jobs, e.g. `Jobsub_Group=="gm2"`.
pub fn group_constraint(attribute: &str, group: &str) -> String {
    let escaped = group.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{}==\"{}\"", attribute, escaped)
}

/// File paths named by one job record.
///
/// Records without the attribute, or with it undefined, name nothing. The
/// value is split on `,` verbatim; empty segments are kept.
pub fn files_from_record(record: &JobRecord, attribute: &str) -> Result<Vec<FilePath>> {
    match record.string_attr(attribute)? {
        Some(value) => Ok(value.split(',').map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

/// Collect the files referenced by `group`'s jobs on one scheduler.
///
/// # Errors
///
/// - [`DiscoveryError::SchedulerQuery`] if the scheduler can't be queried
/// - [`DiscoveryError::UnsupportedAttributeType`] if any record carries a
///   non-string file attribute; the records already read are discarded
/// - [`DiscoveryError::Cancelled`] if `cancel` fires during the query
pub async fn extract(
    query: &dyn ClusterQuery,
    attrs: &JobAttributes,
    group: &str,
    endpoint: &SchedulerEndpoint,
    cancel: &CancellationToken,
) -> Result<Vec<FilePath>> {
    let constraint = group_constraint(&attrs.group, group);
    let records = query
        .list_jobs(endpoint.as_str(), &constraint, &attrs.files, cancel)
        .await
        .map_err(|e| DiscoveryError::scheduler(endpoint.as_str(), e))?;

    let mut files = Vec::new();
    for record in &records {
        files.extend(files_from_record(record, &attrs.files)?);
    }

    tracing::debug!(
        group,
        endpoint = %endpoint,
        jobs = records.len(),
        files = files.len(),
        "Extracted active files"
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AttributeValue;

    #[test]
    fn group_constraint_quotes_group() {
        assert_eq!(group_constraint("Jobsub_Group", "gm2"), r#"Jobsub_Group=="gm2""#);
    }

    #[test]
    fn group_constraint_escapes_quotes() {
        assert_eq!(
            group_constraint("Jobsub_Group", r#"a"b\c"#),
            r#"Jobsub_Group=="a\"b\\c""#
        );
    }

    #[test]
    fn split_keeps_duplicates_and_empty_segments() {
        let record = JobRecord::new().with(
            "PNFS_INPUT_FILES",
            AttributeValue::String("a.dat,,b.dat,b.dat".to_string()),
        );
        assert_eq!(
            files_from_record(&record, "PNFS_INPUT_FILES").unwrap(),
            vec!["a.dat", "", "b.dat", "b.dat"]
        );
    }

    #[test]
    fn split_does_not_trim() {
        let record = JobRecord::new().with(
            "PNFS_INPUT_FILES",
            AttributeValue::String(" a.dat, b.dat".to_string()),
        );
        assert_eq!(
            files_from_record(&record, "PNFS_INPUT_FILES").unwrap(),
            vec![" a.dat", " b.dat"]
        );
    }

    #[test]
    fn missing_attribute_names_nothing() {
        assert!(files_from_record(&JobRecord::new(), "PNFS_INPUT_FILES")
            .unwrap()
            .is_empty());
    }
}

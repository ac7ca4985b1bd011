use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::QueryError;
use crate::record::{parse_records, JobRecord};

/// Builder for one invocation of an HTCondor query tool with `-json` output.
///
/// The child is killed if the query is cancelled or its future is dropped.
#[derive(Debug, Clone)]
pub struct CondorCommand {
    program: PathBuf,
    args: Vec<String>,
    name: Option<String>,
    constraint: Option<String>,
    attributes: Vec<String>,
}

impl CondorCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            name: None,
            constraint: None,
            attributes: Vec::new(),
        }
    }

    /// Extra raw argument, e.g. `-schedd`.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Daemon to query (`-name`).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    /// Attribute to project; may be called repeatedly.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    /// Full argument list, in the order it is passed to the tool.
    pub fn args(&self) -> Vec<String> {
        let mut args = self.args.clone();

        if let Some(ref name) = self.name {
            args.push("-name".to_string());
            args.push(name.clone());
        }

        if let Some(ref constraint) = self.constraint {
            args.push("-constraint".to_string());
            args.push(constraint.clone());
        }

        if !self.attributes.is_empty() {
            args.push("-attributes".to_string());
            args.push(self.attributes.join(","));
        }

        args.push("-json".to_string());
        args
    }

    /// Run the tool and decode its records.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<Vec<JobRecord>, QueryError> {
        let program = self.program.display().to_string();
        let args = self.args();
        tracing::debug!(program = %program, args = ?args, "Running query");

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(program = %program, "Query cancelled, killing child process");
                return Err(QueryError::Cancelled);
            }
            result = command.output() => result,
        };

        Self::process_output(program, result)
    }

    fn process_output(
        program: String,
        result: Result<std::process::Output, std::io::Error>,
    ) -> Result<Vec<JobRecord>, QueryError> {
        let output = result.map_err(|source| QueryError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(QueryError::Failed {
                program,
                status: output.status,
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records =
            parse_records(&stdout).map_err(|source| QueryError::Decode {
                program: program.clone(),
                source,
            })?;

        tracing::debug!(program = %program, records = records.len(), "Query completed");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_for_pool_query() {
        let cmd = CondorCommand::new("/usr/bin/condor_status")
            .with_arg("-schedd")
            .with_constraint("InDowntime==false")
            .with_attribute("Name");
        assert_eq!(
            cmd.args(),
            vec![
                "-schedd",
                "-constraint",
                "InDowntime==false",
                "-attributes",
                "Name",
                "-json"
            ]
        );
    }

    #[test]
    fn args_for_named_query_join_attributes() {
        let cmd = CondorCommand::new("condor_q")
            .with_name("schedd01")
            .with_attribute("A")
            .with_attribute("B");
        assert_eq!(
            cmd.args(),
            vec!["-name", "schedd01", "-attributes", "A,B", "-json"]
        );
    }

    #[test]
    fn args_without_options_only_request_json() {
        assert_eq!(CondorCommand::new("condor_q").args(), vec!["-json"]);
    }
}

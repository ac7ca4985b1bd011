use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::TokenConfig;
use crate::error::{DiscoveryError, Result};

/// Obtains the credential a group's scheduler queries run under.
#[async_trait]
pub trait TokenProvisioner: Send + Sync {
    async fn provision(&self, group: &str, cancel: &CancellationToken) -> Result<()>;
}

/// Runs `htgettoken -a <vault server> -i <group>`.
///
/// The tool's stdout and stderr both go to this process's stderr, keeping
/// stdout free for the rendered result; only its exit status is consumed.
#[derive(Debug, Clone)]
pub struct Htgettoken {
    program: PathBuf,
    vault_server: String,
}

impl Htgettoken {
    pub fn new(program: impl Into<PathBuf>, vault_server: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            vault_server: vault_server.into(),
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.program.clone(), config.vault_server.clone())
    }

    pub fn args(&self, group: &str) -> Vec<String> {
        vec![
            "-a".to_string(),
            self.vault_server.clone(),
            "-i".to_string(),
            group.to_string(),
        ]
    }
}

#[async_trait]
impl TokenProvisioner for Htgettoken {
    async fn provision(&self, group: &str, cancel: &CancellationToken) -> Result<()> {
        let args = self.args(group);
        let command_line = format!("{} {}", self.program.display(), args.join(" "));
        tracing::info!(group, command = %command_line, "Requesting bearer token");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DiscoveryError::Credential {
                group: group.to_string(),
                reason: format!("could not start {}: {}", self.program.display(), e),
            })?;

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(group, "Token request cancelled");
                return Err(DiscoveryError::Cancelled);
            }
            status = child.wait() => status,
        };

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(DiscoveryError::Credential {
                group: group.to_string(),
                reason: format!("{} exited with {}", self.program.display(), status),
            }),
            Err(e) => Err(DiscoveryError::Credential {
                group: group.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Provisioner for runs where credentials are managed outside this tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipToken;

#[async_trait]
impl TokenProvisioner for SkipToken {
    async fn provision(&self, group: &str, _cancel: &CancellationToken) -> Result<()> {
        tracing::debug!(group, "Token request skipped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_scope_request_to_group() {
        let provisioner = Htgettoken::new("htgettoken", "vault.example.org");
        assert_eq!(
            provisioner.args("sbnd"),
            vec!["-a", "vault.example.org", "-i", "sbnd"]
        );
    }
}

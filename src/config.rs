use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DiscoveryError, Result};

/// Credential issuance settings.
///
/// The issuing tool is run once per group before that group's schedulers are
/// queried.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Run the issuing tool at all. When false no credential is requested.
    pub enabled: bool,
    /// Issuing program, resolved through `PATH` when not absolute.
    pub program: PathBuf,
    /// Authority the program requests tokens from (passed as `-a`).
    pub vault_server: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: PathBuf::from("htgettoken"),
            vault_server: "htvaultprod.fnal.gov".to_string(),
        }
    }
}

/// Names of the job attributes a discovery pass reads and filters on.
#[derive(Debug, Clone)]
pub struct JobAttributes {
    pub group: String,
    pub files: String,
}

/// Static configuration for a discovery run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Tenant groups, processed in this order.
    pub groups: Vec<String>,
    /// Storage area per group, for groups that don't follow the default layout.
    pub storage_area_overrides: BTreeMap<String, String>,
    /// Eligibility predicate handed to the pool coordinator.
    pub schedd_constraint: String,
    pub group_attribute: String,
    pub file_attribute: String,
    pub condor_status: PathBuf,
    pub condor_q: PathBuf,
    pub token: TokenConfig,
    /// Deadline for the whole run. No deadline when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let mut storage_area_overrides = BTreeMap::new();
        storage_area_overrides.insert(
            "gm2".to_string(),
            "/pnfs/GM2/resilient/jobsub_stage".to_string(),
        );

        Self {
            groups: vec!["gm2".to_string(), "sbnd".to_string()],
            storage_area_overrides,
            schedd_constraint: "InDowntime==false && IsJobsubLite==true".to_string(),
            group_attribute: "Jobsub_Group".to_string(),
            file_attribute: "PNFS_INPUT_FILES".to_string(),
            condor_status: PathBuf::from("/usr/bin/condor_status"),
            condor_q: PathBuf::from("/usr/bin/condor_q"),
            token: TokenConfig::default(),
            timeout_secs: None,
        }
    }
}

impl DiscoveryConfig {
    /// Load a TOML configuration file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DiscoveryError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| DiscoveryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(DiscoveryError::Config("no groups configured".to_string()));
        }
        if self.groups.iter().any(|g| g.trim().is_empty()) {
            return Err(DiscoveryError::Config("empty group name".to_string()));
        }
        Ok(())
    }

    /// Storage area holding the given group's files.
    pub fn storage_area(&self, group: &str) -> String {
        self.storage_area_overrides
            .get(group)
            .cloned()
            .unwrap_or_else(|| format!("/pnfs/{}/resilient/jobsub_stage", group))
    }

    pub fn job_attributes(&self) -> JobAttributes {
        JobAttributes {
            group: self.group_attribute.clone(),
            files: self.file_attribute.clone(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }
}

//! Access to the scheduler pool.
//!
//! - [`ClusterQuery`]: the two queries discovery needs (list schedulers, list
//!   a scheduler's jobs)
//! - [`CondorClient`]: implementation on top of the HTCondor command-line tools
//! - [`CondorCommand`]: builder that runs one tool invocation and decodes its
//!   `-json` output into [`JobRecord`](crate::record::JobRecord)s

pub mod client;
pub mod command;

pub use client::{ClusterQuery, CondorClient};
pub use command::CondorCommand;

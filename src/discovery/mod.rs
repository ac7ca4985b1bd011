//! Active-file discovery across the scheduler pool.
//!
//! A pass runs in four stages:
//!
//! 1. [`enumerate`]: ask the pool coordinator for eligible schedulers (once)
//! 2. per group, request a credential through a
//!    [`TokenProvisioner`](crate::token::TokenProvisioner)
//! 3. [`aggregate`]: fan out one [`extract`] call per scheduler and merge the
//!    paths into the group's [`GroupFileSet`]
//! 4. [`Driver`] collects every group's set into a [`DiscoveryResult`]
//!
//! Only a failed enumeration (or cancellation) ends a pass early. A scheduler
//! that can't be queried just contributes no files.

pub mod aggregator;
pub mod driver;
pub mod enumerator;
pub mod extractor;
pub mod fileset;

pub use aggregator::{aggregate, aggregate_group, Aggregation};
pub use driver::{DiscoveryResult, Driver, GroupReport};
pub use enumerator::{enumerate, SchedulerEndpoint};
pub use extractor::extract;
pub use fileset::{FilePath, GroupFileSet};

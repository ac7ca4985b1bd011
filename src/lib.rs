pub mod condor;
pub mod config;
pub mod discovery;
pub mod error;
pub mod record;
pub mod shutdown;
pub mod token;

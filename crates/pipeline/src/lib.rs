//! `pipeline` crate — configuration, run normalization and the batch driver
//! that moves workflow runs from a [`github::RunSource`] into a
//! [`sink::RunSink`].

pub mod config;
pub mod driver;
pub mod error;
pub mod memory;
pub mod normalize;
pub mod sink;

pub use config::{PipelineConfig, RepoRef};
pub use driver::{run, run_batch, BatchReport, BatchSummary, NoWorkReason};
pub use error::{ConfigError, PipelineError};
pub use normalize::normalize;
pub use sink::{PgConnector, RunSink, SinkConnector};

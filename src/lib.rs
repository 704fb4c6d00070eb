//! Commit selection for long-running code metrics studies.
//!
//! Analyzing every commit of every repository is too expensive, so this
//! crate picks a handful of representative commits per repository or project:
//!
//! - [`boundary`] finds where a repository adopted the framework under study
//! - [`sampling`] spreads N samples over the commit or tag timeline
//! - [`milestone`] anchors a date by fuzzy-matching milestone titles
//! - [`burst`] confirms a milestone from a burst of commits followed by a pause
//!
//! [`history`] and [`hosting`] are the collaborators the algorithms read
//! from; [`pipeline`] runs them over many repositories and [`report`] writes
//! the results.

pub mod boundary;
pub mod burst;
pub mod config;
pub mod error;
pub mod history;
pub mod hosting;
pub mod logging;
pub mod milestone;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod sampling;
pub mod similarity;
pub mod workspace;

pub use error::{Error, Result};
pub use model::{Commit, CommitId, ProjectId, SampleCount, SampleRequest};

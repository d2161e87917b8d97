//! Configuration for pollexec.
//!
//! The [`Config`] struct is not constructable, use [`ConfigBuilder`].
//!
//! # Examples
//!
//! ```
//! # use pollexec::config::ConfigBuilder;
//! ConfigBuilder::default()
//!     .cmd(vec!["cargo".into(), "test".into()])
//!     .paths(vec!["/tmp".into()])
//!     .build()
//!     .expect("mission failed");
//! ```

use std::{path::PathBuf, time::Duration};

/// Smallest unit of time the poll interval is expressed in.
pub const GRANULARITY: Duration = Duration::from_millis(100);

/// Arguments to the watcher
#[derive(Builder, Clone, Debug)]
#[builder(setter(into))]
#[builder(build_fn(validate = "Self::validate"))]
#[non_exhaustive]
pub struct Config {
    /// Command to execute, program first, then its arguments.
    pub cmd: Vec<String>,
    /// Absolute paths to scan for changes.
    pub paths: Vec<PathBuf>,
    /// Ignore entries: path suffixes or glob patterns.
    #[builder(default)]
    pub ignores: Vec<String>,
    /// Time between two scans.
    #[builder(default = "GRANULARITY")]
    pub poll_interval: Duration,
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.cmd.as_ref().map_or(true, Vec::is_empty) {
            return Err("cmd must not be empty".into());
        }

        if self.paths.as_ref().map_or(true, Vec::is_empty) {
            return Err("paths must not be empty".into());
        }

        if self.poll_interval.map_or(false, |interval| interval == Duration::from_secs(0)) {
            return Err("poll_interval must be positive".into());
        }

        Ok(())
    }
}

/// Rounds a tick speed in milliseconds to the nearest [`GRANULARITY`] step.
///
/// Anything below half a step still polls once per step.
pub fn round_to_granularity(millis: u64) -> Duration {
    let step = GRANULARITY.as_millis() as u64;
    let steps = (millis + step / 2) / step;
    Duration::from_millis(steps.max(1) * step)
}

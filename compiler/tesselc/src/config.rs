//! Session configuration.
//!
//! A [`SessionConfig`] names this process's place in the cluster and the
//! evaluation knobs. It is built in code through [`SessionBuilder`] or read
//! from the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `TESSEL_LOCALITY` | this locality's id | `0` |
//! | `TESSEL_NUM_LOCALITIES` | cluster size | `1` |
//! | `TESSEL_COLLECTIVE_TIMEOUT_MS` | collective timeout | `30000` |
//! | `TESSEL_WORKER_THREADS` | worker threads of the session runtime | tokio's default |
//!
//! [`SessionBuilder`]: crate::SessionBuilder

use std::str::FromStr;
use std::time::Duration;

use tessel_patterns::{EvalMode, DEFAULT_COLLECTIVE_TIMEOUT};

use crate::error::ConfigError;

pub const LOCALITY_VAR: &str = "TESSEL_LOCALITY";
pub const NUM_LOCALITIES_VAR: &str = "TESSEL_NUM_LOCALITIES";
pub const COLLECTIVE_TIMEOUT_VAR: &str = "TESSEL_COLLECTIVE_TIMEOUT_MS";
pub const WORKER_THREADS_VAR: &str = "TESSEL_WORKER_THREADS";

/// Where a session sits in its cluster and how it evaluates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// This locality's id, `0..num_localities`.
    pub locality: u32,
    pub num_localities: u32,
    /// How long a collective waits for the other localities.
    pub collective_timeout: Duration,
    /// Mode compiled programs evaluate in.
    pub mode: EvalMode,
    /// Worker threads of the runtime built for blocking calls.
    pub worker_threads: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            locality: 0,
            num_localities: 1,
            collective_timeout: DEFAULT_COLLECTIVE_TIMEOUT,
            mode: EvalMode::empty(),
            worker_threads: None,
        }
    }
}

impl SessionConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`; unset variables keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = SessionConfig::default();
        if let Some(id) = parse_var(&lookup, LOCALITY_VAR)? {
            config.locality = id;
        }
        if let Some(count) = parse_var(&lookup, NUM_LOCALITIES_VAR)? {
            config.num_localities = count;
        }
        if let Some(millis) = parse_var::<u64>(&lookup, COLLECTIVE_TIMEOUT_VAR)? {
            config.collective_timeout = Duration::from_millis(millis);
        }
        config.worker_threads = parse_var(&lookup, WORKER_THREADS_VAR)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values are consistent with each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_localities == 0 {
            return Err(ConfigError::NoLocalities);
        }
        if self.locality >= self.num_localities {
            return Err(ConfigError::LocalityOutOfRange {
                id: self.locality,
                count: self.num_localities,
            });
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::NoWorkerThreads);
        }
        Ok(())
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests;

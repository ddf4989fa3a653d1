use crate::{Error, Result};
use std::time::Duration;

// region:        --- Defaults

pub const DEFAULT_THREADS: usize = 20;
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

// endregion:     --- Defaults

/// Immutable settings of one probing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub concurrency: usize,
    pub timeout: Duration,
    pub candidate_limit: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_THREADS,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            candidate_limit: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::configuration("concurrency must be greater than 0"));
        }
        if self.timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than 0"));
        }
        Ok(())
    }
}

//! Publisher configuration
//!
//! Controls where endpoints live and how the per-stream queues and drain
//! workers behave. All knobs apply per published chain.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default per-stream queue capacity (events)
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default bound on a single subscriber write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default bound on worker shutdown during unpublish
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for IPC publishing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Directory that holds the per-chain socket files
    pub base_dir: PathBuf,
    /// Capacity of each stream's event queue; a full queue drops the newest
    /// event rather than blocking the engine
    pub queue_capacity: usize,
    /// Maximum time a drain worker spends writing to one subscriber before
    /// disconnecting it
    #[serde(with = "duration_millis")]
    pub write_timeout: Duration,
    /// Maximum time unpublish waits for a drain worker before aborting it
    #[serde(with = "duration_millis")]
    pub shutdown_timeout: Duration,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            base_dir: std::env::temp_dir().join("chaintap"),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl IpcConfig {
    /// Set the socket directory
    pub fn with_base_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.base_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the per-stream queue capacity (clamped to a minimum of 1)
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the per-write subscriber timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the worker shutdown bound
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Simulation parameters. Built once from the CLI, shared read-only by every
/// agent in the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub server: String,
    pub app_id: String,
    pub group_id: String,
    pub oem: String,
    pub version: String,
    pub instances: u32,
    pub min_sleep: u64,
    pub max_sleep: u64,
    pub ping_count: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:8000".to_string(),
            app_id: String::new(),
            group_id: String::new(),
            oem: "fakeclient".to_string(),
            version: "0.0.0".to_string(),
            instances: 20,
            min_sleep: 1,
            max_sleep: 10,
            ping_count: 0,
        }
    }
}

impl SimConfig {
    /// Startup-only validation; anything failing here aborts the simulator
    /// before a single agent spawns.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.is_empty() {
            return Err(Error::Usage("app id must not be empty".to_string()));
        }
        if self.group_id.is_empty() {
            return Err(Error::Usage("group id must not be empty".to_string()));
        }
        if self.min_sleep > self.max_sleep {
            return Err(Error::Usage(format!(
                "min sleep {}s exceeds max sleep {}s",
                self.min_sleep, self.max_sleep
            )));
        }
        Ok(())
    }
}

//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Settings for the periodic blob sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the background worker runs inside the server process.
    #[serde(default)]
    pub enabled: bool,
    /// Six-field cron expression for the sweep (default: hourly).
    #[serde(default = "default_sweep_schedule")]
    pub sweep_schedule: String,
    /// Unreferenced blobs newer than this are left alone, in seconds.
    #[serde(default = "default_grace")]
    pub sweep_grace_seconds: u64,
    /// Tenants swept on every run.
    #[serde(default)]
    pub tenants: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sweep_schedule: default_sweep_schedule(),
            sweep_grace_seconds: default_grace(),
            tenants: Vec::new(),
        }
    }
}

fn default_sweep_schedule() -> String {
    "0 0 * * * *".to_string()
}

fn default_grace() -> u64 {
    3600
}

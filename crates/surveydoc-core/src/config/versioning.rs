//! Document versioning configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Versioning protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Maximum number of version records kept per document, including the
    /// one being written.
    #[serde(default = "default_max_versions")]
    pub max_versions: usize,
    /// Retry policy applied on version conflicts.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Age, in seconds, after which a blob at a version path that no record
    /// references may be replaced by a new upload. Must outlast any
    /// in-flight update, so it is at least the request timeout.
    #[serde(default = "default_orphan_reclaim")]
    pub orphan_reclaim_seconds: u64,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            max_versions: default_max_versions(),
            retry: RetryConfig::default(),
            orphan_reclaim_seconds: default_orphan_reclaim(),
        }
    }
}

/// Bounded exponential backoff for conflicting updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one. `1` disables retrying.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    /// Upper bound for a single delay, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_versions() -> usize {
    10
}

fn default_orphan_reclaim() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    50
}

fn default_max_delay() -> u64 {
    1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 350,
        };
        assert_eq!(retry.delay_for(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for(3), Duration::from_millis(350));
        assert_eq!(retry.delay_for(40), Duration::from_millis(350));
    }
}

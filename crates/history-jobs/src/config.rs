//! Executor configuration.

use serde::{Deserialize, Serialize};

/// Configuration for one job executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Number of jobs that may wait in the queue before `submit` blocks.
    /// Values below 1 are raised to 1.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl ExecutorConfig {
    /// Config with the given queue capacity.
    pub fn with_capacity(queue_capacity: usize) -> Self {
        Self { queue_capacity }
    }

    /// Capacity actually used for the channel.
    pub fn effective_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.queue_capacity, 100);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        assert_eq!(ExecutorConfig::with_capacity(0).effective_capacity(), 1);
        assert_eq!(ExecutorConfig::with_capacity(7).effective_capacity(), 7);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: ExecutorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.queue_capacity, 100);
    }
}

//! Execution settings shared by the batch engines

use serde::{Deserialize, Serialize};

/// Controls how batch loops (frames, points) are scheduled
///
/// Results never depend on the policy: every iteration writes to its own
/// indexed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// Allow rayon parallelism across the outer index
    pub parallel: bool,
    /// Minimum number of items before work is split across threads
    pub min_parallel_len: usize,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            parallel: true,
            min_parallel_len: 64,
        }
    }
}

impl ExecutionPolicy {
    /// Single-threaded policy
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Whether a loop over `len` items should run in parallel
    pub fn use_parallel(&self, len: usize) -> bool {
        self.parallel && len >= self.min_parallel_len.max(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        let policy = ExecutionPolicy::default();
        assert!(!policy.use_parallel(10));
        assert!(policy.use_parallel(64));
        assert!(!ExecutionPolicy::sequential().use_parallel(10_000));
    }

    #[test]
    fn test_tiny_threshold_never_splits_single_item() {
        let policy = ExecutionPolicy {
            parallel: true,
            min_parallel_len: 0,
        };
        assert!(!policy.use_parallel(1));
        assert!(policy.use_parallel(2));
    }
}

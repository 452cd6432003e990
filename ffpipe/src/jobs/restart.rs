//! Restart policy for recoverable encoder faults.
//!
//! The default preserves the observed behavior: restart immediately and
//! without limit. Deployments that want a bound opt in via configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for automatic restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// Maximum number of restarts; `None` restarts forever.
    pub max_restarts: Option<u32>,
    /// Delay before the first restart in milliseconds.
    pub initial_delay_ms: u64,
    /// Ceiling for backoff delays in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier applied per attempt; 1.0 keeps the delay flat.
    pub backoff_multiplier: f64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: None,
            initial_delay_ms: 0,
            max_delay_ms: 30_000,
            backoff_multiplier: 1.0,
        }
    }
}

impl RestartPolicy {
    /// Whether another restart should be attempted after `performed` restarts.
    pub fn should_restart(&self, performed: u32) -> bool {
        match self.max_restarts {
            Some(max) => performed < max,
            None => true,
        }
    }

    /// Delay before restart attempt number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.initial_delay_ms == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_delay_ms as f64
            * self
                .backoff_multiplier
                .powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis(base.min(self.max_delay_ms as f64) as u64)
    }
}

/// Whether a runtime error message matches a transient transport fault.
///
/// These are the patterns the encoder emits on network hiccups; anything
/// else is treated as fatal.
pub fn is_recoverable(message: &str) -> bool {
    message.contains("Input/output error") || message.contains("Conversion failed!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_restarts_forever_and_immediately() {
        let policy = RestartPolicy::default();
        assert!(policy.should_restart(0));
        assert!(policy.should_restart(10_000));
        assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(50), Duration::ZERO);
    }

    #[test]
    fn capped_policy_stops_at_the_limit() {
        let policy = RestartPolicy {
            max_restarts: Some(3),
            ..RestartPolicy::default()
        };
        assert!(policy.should_restart(2));
        assert!(!policy.should_restart(3));
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let policy = RestartPolicy {
            max_restarts: None,
            initial_delay_ms: 1000,
            max_delay_ms: 4000,
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(4000));
    }

    #[test]
    fn io_and_conversion_faults_are_recoverable() {
        assert!(is_recoverable(
            "av_interleaved_write_frame(): Input/output error"
        ));
        assert!(is_recoverable("Conversion failed!"));
        assert!(!is_recoverable("Unknown encoder 'libx265'"));
        assert!(!is_recoverable("ffmpeg exited with status 1"));
    }
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Engine configuration.

use weft_effects::Wait;

/// What happens when a detached task's coroutine raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetachedFailures {
    /// Drop the error; the run continues.
    #[default]
    Swallow,
    /// Abort the run with the error. Still never propagated structurally.
    Surface,
}

/// Malformed configuration. Fatal at start, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("step ceiling must be positive; a ceiling of 0 would abort every run immediately")]
    ZeroStepCeiling,

    #[error("default fork tier cannot be a blocked tier ({0}); use `Ready`, `Tick(n)`, or `Idle`")]
    BlockedForkTier(Wait),
}

/// Engine configuration. One value per run; nothing persists across runs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard stop for the deadlock guard: total scheduler iterations plus
    /// interpreter steps a run may consume.
    pub step_ceiling: u64,
    /// Initial wait tier of forked tasks that don't request one.
    pub fork_tier: Wait,
    /// Policy for failures raised inside detached tasks.
    pub detached_failures: DetachedFailures,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_ceiling: 10_000,
            fork_tier: Wait::Ready,
            detached_failures: DetachedFailures::Swallow,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_ceiling == 0 {
            return Err(ConfigError::ZeroStepCeiling);
        }
        if let Wait::Blocked(_) = self.fork_tier {
            return Err(ConfigError::BlockedForkTier(self.fork_tier));
        }
        Ok(())
    }
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Run-level error taxonomy. Every failure here is terminal to the run.

use weft_effects::{TaskId, TestedError};

use crate::config::ConfigError;
use crate::guard::DeadlockError;
use crate::handler::HandlerError;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Malformed configuration, caught before the first step.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The deadlock guard fired; carries the full pending dump.
    #[error(transparent)]
    Deadlock(#[from] DeadlockError),

    /// An external effect handler failed (e.g. unmatched expectation).
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// Code under test raised, nothing on the structural parent chain
    /// caught it (or a surfaced detached task failed).
    #[error("task {task} failed: {source}")]
    Tested {
        task: TaskId,
        #[source]
        source: TestedError,
    },
}

impl RunError {
    /// The pending dump, when this failure carries one.
    pub fn dump(&self) -> Option<&crate::guard::Dump> {
        match self {
            RunError::Deadlock(deadlock) => Some(&deadlock.dump),
            _ => None,
        }
    }
}

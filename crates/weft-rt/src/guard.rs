// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Deadlock guard: stall detection, the step ceiling, and the pending dump.

use weft_effects::{TaskId, Value, Wait};

use crate::registry::TaskRegistry;

/// Which of the two fatal triggers fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlockTrigger {
    /// Non-empty pending set with no selectable task: a genuine cycle.
    Stall,
    /// Step counter exceeded the configured ceiling: tested code that
    /// never terminates, or a ceiling set too low.
    StepCeiling,
}

impl std::fmt::Display for DeadlockTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeadlockTrigger::Stall => write!(f, "no pending task is eligible to run"),
            DeadlockTrigger::StepCeiling => write!(f, "step ceiling exceeded"),
        }
    }
}

/// One pending task at the moment the guard fired. The field set is a
/// fixed contract; rendering is up to the harness.
#[derive(Debug, Clone)]
pub struct DumpEntry {
    pub id: TaskId,
    pub name: String,
    pub wait: Wait,
    pub dependencies: Vec<TaskId>,
    pub partial_value: Option<Value>,
}

/// Ordered snapshot of every still-pending task.
#[derive(Debug, Clone)]
pub struct Dump {
    pub header: String,
    pub entries: Vec<DumpEntry>,
}

impl Dump {
    pub(crate) fn capture(registry: &TaskRegistry, trigger: DeadlockTrigger, steps: u64) -> Self {
        let entries: Vec<DumpEntry> = registry
            .pending_ids()
            .into_iter()
            .map(|id| {
                let task = registry.task(id);
                DumpEntry {
                    id,
                    name: task.name.clone(),
                    wait: task.wait,
                    dependencies: task
                        .interruption
                        .as_ref()
                        .map(|interruption| interruption.dependencies.iter().copied().collect())
                        .unwrap_or_default(),
                    partial_value: task
                        .interruption
                        .as_ref()
                        .and_then(|interruption| interruption.partial_value()),
                }
            })
            .collect();
        Dump {
            header: format!(
                "{} after {} step(s); {} task(s) still pending",
                trigger,
                steps,
                entries.len()
            ),
            entries,
        }
    }
}

/// Always fatal, never recoverable; always carries the full pending dump.
#[derive(Debug, thiserror::Error)]
#[error("deadlock: {}", .dump.header)]
pub struct DeadlockError {
    pub trigger: DeadlockTrigger,
    pub dump: Dump,
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Task representation: one scheduling/ownership unit in the run arena.

use weft_effects::{Coroutine, TaskId, TaskMarker, TestedError, Value, Wait};

use crate::interrupt::Interruption;

/// A task in the arena. May or may not drive its own coroutine: synthetic
/// tasks (tick delays, parked waiters, composite placeholders) carry none
/// and finish with a preset or interruption-supplied value.
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub wait: Wait,
    /// Structural ownership edges, in fork order. Never repeats an id.
    /// Non-empty children block batch selection regardless of `wait`.
    pub children: Vec<TaskId>,
    /// Non-owning back-reference; absent for the root and detached tasks.
    pub parent: Option<TaskId>,
    /// Why the task cannot progress on its own, if blocked.
    pub interruption: Option<Interruption>,
    /// Final value once the coroutine (or synthetic completion) finishes.
    pub result: Option<Value>,
    /// Set when the coroutine raised without catching.
    pub failure: Option<TestedError>,
    /// Observed cooperatively via the is-cancelled effect, never forced.
    pub cancelled: bool,
    pub detached: bool,
    pub coroutine: Option<Box<dyn Coroutine>>,
    /// True once the task has finished and left the pending set.
    pub finished: bool,
}

impl Task {
    pub fn marker(&self) -> TaskMarker {
        TaskMarker {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// The result a dependent resumes with. Failed tasks resolve their
    /// dependents with `Null`; the failure itself travels the structural
    /// parent chain instead.
    pub fn result_value(&self) -> Value {
        self.result.clone().unwrap_or(Value::Null)
    }

    /// Eligible for batch selection: no live children and no unresolved
    /// interruption gating it.
    pub fn selectable(&self) -> bool {
        self.children.is_empty()
            && self
                .interruption
                .as_ref()
                .map_or(true, |interruption| interruption.resolved)
    }

    pub(crate) fn add_child(&mut self, child: TaskId) {
        debug_assert!(!self.children.contains(&child), "duplicate child id");
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: TaskId) {
        self.children.retain(|id| *id != child);
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("wait", &self.wait)
            .field("children", &self.children)
            .field("parent", &self.parent)
            .field("interruption", &self.interruption)
            .field("cancelled", &self.cancelled)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

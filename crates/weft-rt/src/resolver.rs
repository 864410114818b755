// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Dependency resolution: bubble completions up through the graph.
//!
//! Each newly finished task is removed from its parent's child list and
//! substituted into every pending interruption that references it. A
//! satisfied interruption resumes its owner immediately when the owner is
//! "now"-equivalent and childless; completions produced that way feed the
//! same pass recursively, without returning to the scheduler loop.

use weft_effects::{BlockKind, TaskId, Value};

use crate::engine::Engine;
use crate::error::RunError;
use crate::handler::EffectHandler;
use crate::interrupt::Slot;

impl<H: EffectHandler> Engine<H> {
    /// Drain the completion queue until no further completion occurs.
    pub(crate) fn drain_finished(&mut self) -> Result<(), RunError> {
        while let Some(finished) = self.finished.pop_front() {
            self.resolve_finished(finished)?;
        }
        Ok(())
    }

    fn resolve_finished(&mut self, finished: TaskId) -> Result<(), RunError> {
        let result = self.registry.task(finished).result_value();
        tracing::trace!(task = %finished, "resolving completion");

        // Structural edge removal, and the children-drain predicate for a
        // parent whose coroutine already completed.
        if let Some(parent_id) = self.registry.task(finished).parent {
            let parent = self.registry.task_mut(parent_id);
            parent.remove_child(finished);
            if parent.children.is_empty() {
                if let Some(interruption) = parent.interruption.as_mut() {
                    if interruption.kind == BlockKind::Children && !interruption.resolved {
                        let value = interruption.value.clone().unwrap_or(Value::Null);
                        interruption.mark_resolved(value);
                    }
                }
            }
            self.maybe_resume(parent_id)?;
        }

        // Dependency substitution across the pending set, in registration
        // order. The snapshot tolerates mid-pass retirements.
        for pending_id in self.registry.pending_ids() {
            if pending_id == finished || !self.registry.is_pending(pending_id) {
                continue;
            }
            if let Some(losers) = self.apply_completion(pending_id, finished, &result) {
                for loser in losers {
                    self.cancel_task(loser);
                }
            }
            self.maybe_resume(pending_id)?;
        }
        Ok(())
    }

    /// Substitute one finished dependency into one pending task's
    /// interruption and evaluate its completion predicate. Returns the
    /// race losers to cancel, when a race just resolved.
    fn apply_completion(
        &mut self,
        pending_id: TaskId,
        finished: TaskId,
        result: &Value,
    ) -> Option<Vec<TaskId>> {
        let task = self.registry.task_mut(pending_id);
        let interruption = task.interruption.as_mut()?;
        if interruption.resolved || !interruption.dependencies.shift_remove(&finished) {
            return None;
        }
        for slot in interruption.pending.slots_mut() {
            if slot.blocked_on() == Some(finished) {
                *slot = Slot::Resolved(result.clone());
            }
        }

        match interruption.kind {
            BlockKind::Join | BlockKind::All => {
                if interruption.pending.all_resolved() {
                    let value = interruption.pending.collapse();
                    interruption.mark_resolved(value);
                }
                None
            }
            BlockKind::Race => {
                // First resolution wins; everything still blocked loses.
                let losers: Vec<TaskId> = interruption.dependencies.iter().copied().collect();
                interruption.dependencies.clear();
                let value = interruption.pending.collapse_first();
                interruption.mark_resolved(value);
                Some(losers)
            }
            BlockKind::Generator => {
                // Satisfied only by that exact child, which `dependencies`
                // just matched.
                interruption.mark_resolved(result.clone());
                None
            }
            // Children interruptions have no task dependencies; the drain
            // predicate is handled at edge removal.
            BlockKind::Children => None,
        }
    }

    /// Resume a task whose interruption just resolved, if it is eligible
    /// right now; numeric-tier owners wait for their tick batch instead.
    fn maybe_resume(&mut self, id: TaskId) -> Result<(), RunError> {
        if !self.registry.is_pending(id) {
            return Ok(());
        }
        let task = self.registry.task(id);
        let resolved = task
            .interruption
            .as_ref()
            .is_some_and(|interruption| interruption.resolved);
        if resolved && task.children.is_empty() && task.wait.is_now() {
            self.run_one(id)?;
        }
        Ok(())
    }
}

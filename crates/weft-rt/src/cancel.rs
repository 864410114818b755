// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Cooperative cancellation.
//!
//! Cancellation marks a task and the snapshot of its structural subtree;
//! it never halts execution. A cancelled coroutine keeps consuming
//! scheduler rounds until it completes, observing the flag through the
//! is-cancelled effect. Tasks merely referenced by (not owned by) a
//! cancelled task are untouched, and so is anything forked after the
//! snapshot was taken.

use weft_effects::TaskId;

use crate::engine::Engine;
use crate::handler::EffectHandler;

impl<H: EffectHandler> Engine<H> {
    pub(crate) fn cancel_task(&mut self, target: TaskId) {
        // Snapshot of the subtree at this instant, not a live filter.
        let mut snapshot = Vec::new();
        let mut stack = vec![target];
        while let Some(id) = stack.pop() {
            let Some(task) = self.registry.get(id) else {
                continue;
            };
            snapshot.push(id);
            stack.extend(task.children.iter().copied());
        }

        for id in snapshot {
            let task = self.registry.task_mut(id);
            if task.finished {
                continue;
            }
            task.cancelled = true;
            tracing::debug!(task = %id, "cancelled");
            // Synthetic tasks have no coroutine to observe the flag with:
            // finish them now, resultless, so they leave the pending set.
            if task.coroutine.is_none() && task.children.is_empty() {
                task.interruption = None;
                task.result = None;
                self.finish_task(id, None);
            }
        }
    }
}

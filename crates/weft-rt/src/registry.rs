// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The task arena: owns every live task, assigns ids, tracks the pending
//! set and the parent/child ownership edges.
//!
//! `children` are the only ownership edges; `parent` is a non-owning id
//! back-reference, so the cyclic parent/child structure never needs shared
//! ownership. Completed tasks stay in the arena for the rest of the run:
//! interruptions may still reference them as resolved dependencies.

use indexmap::{IndexMap, IndexSet};
use weft_effects::{Coroutine, TaskId, Value, Wait};

use crate::task::Task;

pub struct TaskRegistry {
    tasks: IndexMap<TaskId, Task>,
    /// Insertion order is registration order — the observable tie-break
    /// contract for equal-priority tasks.
    pending: IndexSet<TaskId>,
    next_id: u64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: IndexMap::new(),
            pending: IndexSet::new(),
            next_id: 0,
        }
    }

    /// Register a new task. Ids are never reissued; the first task of a
    /// run (the root) gets id 0.
    pub(crate) fn insert(
        &mut self,
        name: impl Into<String>,
        parent: Option<TaskId>,
        wait: Wait,
        coroutine: Option<Box<dyn Coroutine>>,
        detached: bool,
    ) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let task = Task {
            id,
            name: name.into(),
            wait,
            children: Vec::new(),
            parent,
            interruption: None,
            result: None,
            failure: None,
            cancelled: false,
            detached,
            coroutine,
            finished: false,
        };
        self.tasks.insert(id, task);
        self.pending.insert(id);

        if let Some(parent_id) = parent {
            self.task_mut(parent_id).add_child(id);
        }
        id
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Arena lookup of a registered id. Ids are handed out by `insert` and
    /// never removed, so a miss is a corrupted-arena bug.
    pub(crate) fn task(&self, id: TaskId) -> &Task {
        self.tasks.get(&id).expect("task id not in arena")
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> &mut Task {
        self.tasks.get_mut(&id).expect("task id not in arena")
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending.contains(&id)
    }

    pub fn pending_ids(&self) -> Vec<TaskId> {
        self.pending.iter().copied().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Mark a task finished: ready tier, no interruption, out of the
    /// pending set. `value`, when given, overrides any preset result
    /// (synthetic tasks carry theirs from creation).
    pub(crate) fn finish(&mut self, id: TaskId, value: Option<Value>) {
        let task = self.task_mut(id);
        debug_assert!(task.children.is_empty(), "finishing a task with live children");
        task.wait = Wait::Ready;
        task.interruption = None;
        task.coroutine = None;
        task.finished = true;
        if let Some(value) = value {
            task.result = Some(value);
        }
        self.pending.shift_remove(&id);
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

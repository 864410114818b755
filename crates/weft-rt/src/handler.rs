// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Contract for external (opaque) effect handlers.
//!
//! The engine recognizes fork/call/join/race/all/cancel/is-cancelled
//! structurally; every other effect kind is delegated whole to a handler,
//! payload uninspected. A handler either advances the task with a value,
//! fails it with a tested-code error, or blocks it on a dependency task it
//! creates through [`HandlerCx`].

use weft_effects::{BlockKind, TaskId, TaskMarker, TestedError, Value, Wait};

use crate::interrupt::Interruption;
use crate::registry::TaskRegistry;

/// Handler verdict for one external effect.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// Resume the yielding coroutine with this value.
    Advance(Value),
    /// Throw this error into the yielding coroutine at its suspension point.
    Fail(TestedError),
    /// Block the yielding task until the given dependency task finishes.
    Block(TaskId),
}

/// Fatal handler failures. Nothing in the engine retries.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("no expectation matches effect `{kind}` yielded by task {task} ({name}); payload: {payload}")]
    Unmatched {
        kind: String,
        payload: Value,
        task: TaskId,
        name: String,
    },

    #[error("effect handler failed: {0}")]
    Failed(String),
}

/// The handler's window into the run: who yielded, and the ability to
/// create and complete the synthetic dependency tasks that emulate
/// delays and external occurrences.
pub struct HandlerCx<'a> {
    pub(crate) registry: &'a mut TaskRegistry,
    pub(crate) woken: &'a mut std::collections::VecDeque<TaskId>,
    pub(crate) owner: TaskId,
}

impl<'a> HandlerCx<'a> {
    pub fn owner(&self) -> TaskId {
        self.owner
    }

    pub fn owner_marker(&self) -> TaskMarker {
        self.registry.task(self.owner).marker()
    }

    pub fn owner_cancelled(&self) -> bool {
        self.registry.task(self.owner).cancelled
    }

    /// A synthetic task that completes with `value` once its tick batch
    /// runs. Block on it to emulate a virtual-time delay.
    pub fn delay(&mut self, ticks: u64, value: Value) -> TaskId {
        let name = format!("delay:{}", ticks);
        let id = self
            .registry
            .insert(name, Some(self.owner), Wait::Tick(ticks), None, false);
        self.registry.task_mut(id).result = Some(value);
        id
    }

    /// A synthetic task parked until [`complete`](Self::complete) is called
    /// on it. Its interruption references itself, so an occurrence that
    /// never fires shows up in deadlock dumps as a self-dependency.
    pub fn park(&mut self, label: &str) -> TaskId {
        let id = self.registry.insert(
            label.to_string(),
            Some(self.owner),
            Wait::Blocked(BlockKind::Join),
            None,
            false,
        );
        self.registry.task_mut(id).interruption =
            Some(Interruption::on_task(BlockKind::Join, id));
        id
    }

    /// Complete a synthetic task with a value, waking whatever joins it.
    /// Returns false when the id is unknown, already finished, or drives a
    /// coroutine of its own (only synthetic tasks may be completed).
    pub fn complete(&mut self, id: TaskId, value: Value) -> bool {
        match self.registry.get(id) {
            Some(task) if !task.finished && task.coroutine.is_none() => {}
            _ => return false,
        }
        // Clear the (possibly self-referential) park interruption before
        // finishing so the resolver only sees a plainly finished task.
        self.registry.task_mut(id).interruption = None;
        self.registry.finish(id, Some(value));
        self.woken.push_back(id);
        true
    }
}

/// A run with no external collaborators: every opaque effect is a fatal
/// unmatched-effect error.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHandler;

impl EffectHandler for NullHandler {
    fn handle(
        &mut self,
        kind: &str,
        payload: &Value,
        cx: &mut HandlerCx<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let marker = cx.owner_marker();
        Err(HandlerError::Unmatched {
            kind: kind.to_string(),
            payload: payload.clone(),
            task: marker.id,
            name: marker.name,
        })
    }
}

/// Effect-kind-specific external handling: expectation matching, queue and
/// occurrence emulation, anything the engine treats as opaque.
pub trait EffectHandler {
    fn handle(
        &mut self,
        kind: &str,
        payload: &Value,
        cx: &mut HandlerCx<'_>,
    ) -> Result<HandlerOutcome, HandlerError>;
}

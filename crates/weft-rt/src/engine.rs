// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The interrupt/resume loop.
//!
//! Only the root drives the loop: inline blocks bubble up through calling
//! frames as generator waits until they reach it. Each iteration selects
//! the next ready batch of equal-priority, dependency-free tasks, runs
//! every task in it to its next suspension point, and feeds completions to
//! the dependency resolver until the root finishes or the guard fires.

use std::collections::VecDeque;

use weft_effects::{BlockKind, Coroutine, Resume, Step, TaskId, TestedError, Value, Wait};

use crate::config::{DetachedFailures, EngineConfig};
use crate::error::RunError;
use crate::guard::{DeadlockError, DeadlockTrigger, Dump};
use crate::handler::{EffectHandler, NullHandler};
use crate::interp::StepOutcome;
use crate::interrupt::Interruption;
use crate::priority;
use crate::registry::TaskRegistry;

/// One run-context: registry, step counter, and completion queue are all
/// scoped to a single `run` call and reset on the next.
pub struct Engine<H: EffectHandler = NullHandler> {
    pub(crate) config: EngineConfig,
    pub(crate) handler: H,
    pub(crate) registry: TaskRegistry,
    pub(crate) steps: u64,
    /// Finished tasks awaiting a resolver pass, in completion order.
    pub(crate) finished: VecDeque<TaskId>,
}

impl Engine<NullHandler> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_handler(config, NullHandler)
    }
}

impl<H: EffectHandler> Engine<H> {
    pub fn with_handler(config: EngineConfig, handler: H) -> Self {
        Self {
            config,
            handler,
            registry: TaskRegistry::new(),
            steps: 0,
            finished: VecDeque::new(),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// The run arena, for post-run inspection.
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Steps consumed so far (scheduler iterations + interpreter steps).
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Drive `root` to completion and return its result.
    pub fn run(&mut self, root: Box<dyn Coroutine>) -> Result<Value, RunError> {
        self.config.validate()?;
        self.registry = TaskRegistry::new();
        self.steps = 0;
        self.finished.clear();

        let root_id = self
            .registry
            .insert("root", None, Wait::Ready, Some(root), false);
        debug_assert_eq!(root_id, TaskId::ROOT);

        self.run_one(root_id)?;
        self.drain_finished()?;

        while !self.registry.task(root_id).finished {
            self.bump_step()?;
            let batch = self.select_batch()?;
            tracing::debug!(step = self.steps, batch = batch.len(), "running batch");
            for id in batch {
                // Mid-batch state changes (inline resumes, failures,
                // cancellation) can retire a task before its turn comes.
                if !self.registry.is_pending(id) || !self.registry.task(id).selectable() {
                    continue;
                }
                self.run_one(id)?;
                self.drain_finished()?;
            }
        }
        Ok(self.registry.task(root_id).result_value())
    }

    /// Select the next ready batch, in registration order: every
    /// "now"-equivalent candidate, plus every numeric candidate at or
    /// below the minimal tick. Idle candidates run only when nothing
    /// else can; an empty candidate set is a genuine cycle.
    fn select_batch(&mut self) -> Result<Vec<TaskId>, RunError> {
        let pending = self.registry.pending_ids();
        let mut minimum: Option<Wait> = None;
        let mut selected: Option<u64> = None;

        for &id in &pending {
            let task = self.registry.task(id);
            if !task.selectable() {
                continue;
            }
            minimum = Some(match minimum {
                None => task.wait,
                Some(current) if priority::compare(&task.wait, &current).is_lt() => task.wait,
                Some(current) => current,
            });
            if let Some(tick) = task.wait.tick() {
                selected = Some(selected.map_or(tick, |s: u64| s.min(tick)));
            }
        }
        let Some(minimum) = minimum else {
            return Err(self.deadlock(DeadlockTrigger::Stall).into());
        };

        let mut batch = Vec::new();
        for &id in &pending {
            let task = self.registry.task(id);
            if !task.selectable() {
                continue;
            }
            let eligible = if minimum == Wait::Idle {
                // Last resort: nothing but idle-tier tasks exist.
                task.wait == Wait::Idle
            } else {
                task.wait.is_now()
                    || task
                        .wait
                        .tick()
                        .is_some_and(|tick| selected.is_some_and(|s| tick <= s))
            };
            if eligible {
                batch.push(id);
            }
        }
        Ok(batch)
    }

    /// Run one task to its next suspension point: consume a resolved
    /// interruption if present, else resume the coroutine from scratch.
    /// Synthetic tasks (no coroutine) finish immediately.
    pub(crate) fn run_one(&mut self, id: TaskId) -> Result<(), RunError> {
        let task = self.registry.task_mut(id);
        let input = match task.interruption.take() {
            Some(interruption) if interruption.resolved => {
                // Consumed here, exactly once.
                Resume::Value(interruption.value.unwrap_or(Value::Null))
            }
            Some(interruption) => {
                task.interruption = Some(interruption);
                return Ok(()); // still gated
            }
            None => Resume::Value(Value::Null),
        };

        if task.coroutine.is_none() {
            let value = match input {
                Resume::Value(Value::Null) => None, // keep any preset result
                Resume::Value(value) => Some(value),
                Resume::Failure(_) => None,
            };
            self.finish_task(id, value);
            return Ok(());
        }
        self.drive(id, input)
    }

    /// Resume a coroutine repeatedly until it blocks, completes, or raises.
    pub(crate) fn drive(&mut self, id: TaskId, mut input: Resume) -> Result<(), RunError> {
        loop {
            let mut coroutine = self
                .registry
                .task_mut(id)
                .coroutine
                .take()
                .expect("drive on a task without a coroutine");
            let step = coroutine.resume(input);
            self.registry.task_mut(id).coroutine = Some(coroutine);

            match step {
                Step::Yield(effect) => match self.interpret(id, effect)? {
                    StepOutcome::Advance(value) => input = Resume::Value(value),
                    StepOutcome::Block(interruption) => {
                        let task = self.registry.task_mut(id);
                        task.wait = Wait::Blocked(interruption.kind);
                        task.interruption = Some(interruption);
                        return Ok(());
                    }
                    // Thrown back into the coroutine at its suspension
                    // point so cleanup paths run.
                    StepOutcome::Fail(err) => input = Resume::Failure(err),
                },
                Step::Done(value) => {
                    let task = self.registry.task_mut(id);
                    task.coroutine = None;
                    if task.children.is_empty() {
                        self.finish_task(id, Some(value));
                    } else {
                        // Implicit wait-for-children at completion.
                        task.wait = Wait::Blocked(BlockKind::Children);
                        task.interruption = Some(Interruption::children(value));
                    }
                    return Ok(());
                }
                Step::Raise(err) => return self.fail_task(id, err),
            }
        }
    }

    /// An uncaught failure: finish the task failed, then re-raise up the
    /// structural parent chain — except for detached tasks, whose failures
    /// are swallowed or surfaced per configuration.
    pub(crate) fn fail_task(&mut self, id: TaskId, err: TestedError) -> Result<(), RunError> {
        tracing::debug!(task = %id, error = %err, "task failed");
        let task = self.registry.task_mut(id);
        task.failure = Some(err.clone());
        task.interruption = None;
        task.coroutine = None;
        task.result = None;
        // Children of a failed task keep running but no longer gate it.
        task.children.clear();
        let detached = task.detached;
        let parent = task.parent;
        self.finish_task(id, None);

        if detached {
            match self.config.detached_failures {
                DetachedFailures::Swallow => Ok(()),
                DetachedFailures::Surface => Err(RunError::Tested {
                    task: id,
                    source: err,
                }),
            }
        } else if let Some(parent_id) = parent {
            self.throw_into(parent_id, err)
        } else {
            Err(RunError::Tested {
                task: id,
                source: err,
            })
        }
    }

    /// Throw an error into a suspended task's coroutine, abandoning
    /// whatever it was blocked on.
    fn throw_into(&mut self, id: TaskId, err: TestedError) -> Result<(), RunError> {
        let task = self.registry.task_mut(id);
        if task.finished {
            return Ok(());
        }
        task.interruption = None;
        if task.coroutine.is_some() {
            self.drive(id, Resume::Failure(err))
        } else {
            self.fail_task(id, err)
        }
    }

    pub(crate) fn finish_task(&mut self, id: TaskId, value: Option<Value>) {
        self.registry.finish(id, value);
        self.finished.push_back(id);
        tracing::trace!(task = %id, "finished");
    }

    pub(crate) fn bump_step(&mut self) -> Result<(), RunError> {
        self.steps += 1;
        if self.steps > self.config.step_ceiling {
            return Err(self.deadlock(DeadlockTrigger::StepCeiling).into());
        }
        Ok(())
    }

    pub(crate) fn deadlock(&self, trigger: DeadlockTrigger) -> DeadlockError {
        tracing::debug!(?trigger, "deadlock guard fired");
        DeadlockError {
            trigger,
            dump: Dump::capture(&self.registry, trigger, self.steps),
        }
    }
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Single-step effect interpretation.
//!
//! `interpret(task, effect)` either resolves the effect immediately or
//! reports the owner blocked with an interruption. Dispatch is purely on
//! the effect's kind tag; composite members are interpreted recursively
//! with a no-advance posture (results are collected, the owner is never
//! resumed from inside a composite).

use weft_effects::{
    BlockKind, CallEffect, Effect, Entries, ForkEffect, JoinTarget, Resume, Step, TaskId,
    TaskMarker, TestedError, Value, Wait,
};

use crate::engine::Engine;
use crate::error::RunError;
use crate::handler::{EffectHandler, HandlerCx, HandlerOutcome};
use crate::interrupt::{Interruption, Pending, Slot};

/// Verdict of one interpretation step.
#[derive(Debug)]
pub(crate) enum StepOutcome {
    /// Resume the owner with this value.
    Advance(Value),
    /// The owner is blocked; the caller stores the interruption.
    Block(Interruption),
    /// A tested-code error to throw into the owner at its suspension point.
    Fail(TestedError),
}

impl<H: EffectHandler> Engine<H> {
    pub(crate) fn interpret(
        &mut self,
        owner: TaskId,
        effect: Effect,
    ) -> Result<StepOutcome, RunError> {
        self.bump_step()?;
        match effect {
            Effect::Fork(fork) => {
                let marker = self.fork_task(owner, fork);
                Ok(StepOutcome::Advance(Value::Task(marker)))
            }
            Effect::Call(call) => self.run_inline(owner, call),
            Effect::Join(target) => Ok(self.interpret_join(target)),
            Effect::Race(entries) => self.interpret_composite(owner, BlockKind::Race, entries),
            Effect::All(entries) => self.interpret_composite(owner, BlockKind::All, entries),
            Effect::Cancel(marker) => {
                self.cancel_task(marker.id);
                Ok(StepOutcome::Advance(Value::Null))
            }
            Effect::IsCancelled => Ok(StepOutcome::Advance(Value::Bool(
                self.registry.task(owner).cancelled,
            ))),
            Effect::External { kind, payload } => self.interpret_external(owner, kind, payload),
        }
    }

    /// A run-concurrently effect always creates a new task; the forker
    /// resumes immediately with its marker.
    fn fork_task(&mut self, owner: TaskId, fork: ForkEffect) -> TaskMarker {
        let tier = fork.tier.unwrap_or(self.config.fork_tier);
        let parent = if fork.detached { None } else { Some(owner) };
        let id = self
            .registry
            .insert(fork.name, parent, tier, Some(fork.body), fork.detached);
        tracing::debug!(task = %id, tier = %tier, detached = fork.detached, "forked");
        self.registry.task(id).marker()
    }

    fn interpret_join(&mut self, target: JoinTarget) -> StepOutcome {
        let slot = |registry: &crate::registry::TaskRegistry, marker: &TaskMarker| {
            match registry.get(marker.id) {
                Some(task) if task.finished => Slot::Resolved(task.result_value()),
                _ => Slot::Blocked(marker.id),
            }
        };
        let pending = match &target {
            JoinTarget::One(marker) => Pending::Single(slot(&self.registry, marker)),
            JoinTarget::List(markers) => Pending::List(
                markers
                    .iter()
                    .map(|marker| slot(&self.registry, marker))
                    .collect(),
            ),
            JoinTarget::Keyed(markers) => Pending::Keyed(
                markers
                    .iter()
                    .map(|(key, marker)| (key.clone(), slot(&self.registry, marker)))
                    .collect(),
            ),
        };
        if pending.all_resolved() {
            StepOutcome::Advance(pending.collapse())
        } else {
            StepOutcome::Block(Interruption::new(BlockKind::Join, pending))
        }
    }

    /// An inline call runs its body on behalf of the same task until it
    /// completes or blocks. A block suspends the remainder of the body as
    /// a directly forked child; the caller waits on exactly that child.
    fn run_inline(&mut self, owner: TaskId, call: CallEffect) -> Result<StepOutcome, RunError> {
        let CallEffect { name, mut body } = call;
        // Forks made by the body belong to its frame: if the body
        // suspends, they move under the suspended child so failures
        // unwind through the body before reaching the caller.
        let child_mark = self.registry.task(owner).children.len();
        let mut input = Resume::Value(Value::Null);
        loop {
            match body.resume(input) {
                Step::Yield(effect) => match self.interpret(owner, effect)? {
                    StepOutcome::Advance(value) => input = Resume::Value(value),
                    StepOutcome::Block(inner) => {
                        let moved = self.registry.task_mut(owner).children.split_off(child_mark);
                        let child = self.registry.insert(
                            name,
                            Some(owner),
                            Wait::Blocked(inner.kind),
                            Some(body),
                            false,
                        );
                        self.registry.task_mut(child).interruption = Some(inner);
                        for grandchild in moved {
                            self.registry.task_mut(grandchild).parent = Some(child);
                            self.registry.task_mut(child).add_child(grandchild);
                        }
                        return Ok(StepOutcome::Block(Interruption::on_task(
                            BlockKind::Generator,
                            child,
                        )));
                    }
                    StepOutcome::Fail(err) => input = Resume::Failure(err),
                },
                Step::Done(value) => return Ok(StepOutcome::Advance(value)),
                Step::Raise(err) => return Ok(StepOutcome::Fail(err)),
            }
        }
    }

    /// Race/all: interpret every member, collect the mixed pending shape,
    /// and either advance on an already-satisfied predicate or block.
    fn interpret_composite(
        &mut self,
        owner: TaskId,
        kind: BlockKind,
        entries: Entries,
    ) -> Result<StepOutcome, RunError> {
        let keyed = matches!(entries, Entries::Keyed(_));
        let members: Vec<(String, Effect)> = match entries {
            Entries::Keyed(members) => members,
            Entries::List(members) => members
                .into_iter()
                .enumerate()
                .map(|(index, member)| (index.to_string(), member))
                .collect(),
        };

        let mut slots: Vec<(String, Slot)> = Vec::with_capacity(members.len());
        for (key, member) in members {
            match self.interpret(owner, member)? {
                StepOutcome::Advance(value) => slots.push((key, Slot::Resolved(value))),
                StepOutcome::Block(inner) => {
                    let dep = self.bind_member(owner, kind, &key, inner);
                    slots.push((key, Slot::Blocked(dep)));
                }
                // A failing member aborts the whole composite; the error
                // goes to the owner's suspension point.
                StepOutcome::Fail(err) => return Ok(StepOutcome::Fail(err)),
            }
        }

        let pending = if keyed {
            Pending::Keyed(slots)
        } else {
            Pending::List(slots.into_iter().map(|(_, slot)| slot).collect())
        };

        match kind {
            BlockKind::All if pending.all_resolved() => {
                Ok(StepOutcome::Advance(pending.collapse()))
            }
            BlockKind::Race if pending.any_resolved() => {
                // Already won: hand every still-blocked member's task to
                // the cancellation propagator.
                let losers: Vec<TaskId> = pending.slots().filter_map(Slot::blocked_on).collect();
                for loser in losers {
                    self.cancel_task(loser);
                }
                Ok(StepOutcome::Advance(pending.collapse_first()))
            }
            _ => Ok(StepOutcome::Block(Interruption::new(kind, pending))),
        }
    }

    /// Bind a blocked composite member to a task id. A single-dependency
    /// block binds directly to its dependency; anything wider gets a
    /// synthetic placeholder task carrying the member's interruption.
    /// Placeholder registration order within a round is observable and
    /// therefore a hard contract.
    fn bind_member(
        &mut self,
        owner: TaskId,
        kind: BlockKind,
        key: &str,
        inner: Interruption,
    ) -> TaskId {
        if inner.dependencies.len() == 1 && matches!(inner.pending, Pending::Single(_)) {
            return inner.dependencies[0];
        }
        let name = format!("{}[{}]", kind, key);
        let id = self
            .registry
            .insert(name, Some(owner), Wait::Blocked(inner.kind), None, false);
        self.registry.task_mut(id).interruption = Some(inner);
        id
    }

    /// Delegate an opaque effect to the external handler, payload whole.
    fn interpret_external(
        &mut self,
        owner: TaskId,
        kind: String,
        payload: Value,
    ) -> Result<StepOutcome, RunError> {
        let outcome = {
            let mut cx = HandlerCx {
                registry: &mut self.registry,
                woken: &mut self.finished,
                owner,
            };
            self.handler.handle(&kind, &payload, &mut cx)?
        };
        match outcome {
            HandlerOutcome::Advance(value) => Ok(StepOutcome::Advance(value)),
            HandlerOutcome::Fail(err) => Ok(StepOutcome::Fail(err)),
            HandlerOutcome::Block(dep) => match self.registry.get(dep) {
                // The handler may have completed the dependency in the
                // same breath; don't block on a corpse.
                Some(task) if task.finished => Ok(StepOutcome::Advance(task.result_value())),
                Some(_) => Ok(StepOutcome::Block(Interruption::on_task(
                    BlockKind::Join,
                    dep,
                ))),
                None => Err(crate::handler::HandlerError::Failed(format!(
                    "handler blocked task {} on unknown dependency {}",
                    owner, dep
                ))
                .into()),
            },
        }
    }
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Effect descriptors: one requested operation per suspension point.
//!
//! A closed tagged union, dispatched exhaustively by the engine, plus one
//! open variant (`External`) whose payload the engine never inspects.

use crate::coroutine::Coroutine;
use crate::value::{TaskMarker, Value};
use crate::wait::Wait;

/// A run-concurrently request. Always creates a new task.
pub struct ForkEffect {
    /// Name of the new task, for markers and dumps.
    pub name: String,
    /// The computation the new task drives.
    pub body: Box<dyn Coroutine>,
    /// Detached tasks have no structural parent; their failures are never
    /// propagated upward.
    pub detached: bool,
    /// Initial wait tier; the engine configuration supplies the default.
    pub tier: Option<Wait>,
}

/// An inline call: the body runs on behalf of the calling task, in the
/// same scheduling slot, until it completes or blocks.
pub struct CallEffect {
    pub name: String,
    pub body: Box<dyn Coroutine>,
}

/// The shape of a join request. The result mirrors the shape: a single
/// marker resumes with its bare result, a list with an ordered list, a
/// keyed set with a map.
pub enum JoinTarget {
    One(TaskMarker),
    List(Vec<TaskMarker>),
    Keyed(Vec<(String, TaskMarker)>),
}

/// Members of a composite (race/all) effect, indexed or keyed.
pub enum Entries {
    List(Vec<Effect>),
    Keyed(Vec<(String, Effect)>),
}

impl Entries {
    pub fn len(&self) -> usize {
        match self {
            Entries::List(items) => items.len(),
            Entries::Keyed(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One requested operation at a suspension point.
pub enum Effect {
    /// Run a computation concurrently; resumes immediately with a marker.
    Fork(ForkEffect),
    /// Run a computation inline on behalf of the same task.
    Call(CallEffect),
    /// Wait for referenced tasks to produce results.
    Join(JoinTarget),
    /// Resume when the first member resolves; losers are cancelled.
    Race(Entries),
    /// Resume when every member resolves.
    All(Entries),
    /// Cooperatively cancel the referenced task and its current subtree.
    Cancel(TaskMarker),
    /// Query the current task's cancellation flag.
    IsCancelled,
    /// Anything else: delegated whole to the external effect handler.
    External { kind: String, payload: Value },
}

impl Effect {
    pub fn fork(name: impl Into<String>, body: impl Coroutine + 'static) -> Effect {
        Effect::Fork(ForkEffect {
            name: name.into(),
            body: Box::new(body),
            detached: false,
            tier: None,
        })
    }

    /// Fork with an explicit initial tick tier.
    pub fn fork_at(name: impl Into<String>, tick: u64, body: impl Coroutine + 'static) -> Effect {
        Effect::Fork(ForkEffect {
            name: name.into(),
            body: Box::new(body),
            detached: false,
            tier: Some(Wait::Tick(tick)),
        })
    }

    /// Fork with an explicit tier (e.g. `Wait::Idle` for last-resort tasks).
    pub fn fork_tier(name: impl Into<String>, tier: Wait, body: impl Coroutine + 'static) -> Effect {
        Effect::Fork(ForkEffect {
            name: name.into(),
            body: Box::new(body),
            detached: false,
            tier: Some(tier),
        })
    }

    pub fn fork_detached(name: impl Into<String>, body: impl Coroutine + 'static) -> Effect {
        Effect::Fork(ForkEffect {
            name: name.into(),
            body: Box::new(body),
            detached: true,
            tier: None,
        })
    }

    pub fn call(name: impl Into<String>, body: impl Coroutine + 'static) -> Effect {
        Effect::Call(CallEffect {
            name: name.into(),
            body: Box::new(body),
        })
    }

    pub fn join(marker: TaskMarker) -> Effect {
        Effect::Join(JoinTarget::One(marker))
    }

    pub fn join_list(markers: impl IntoIterator<Item = TaskMarker>) -> Effect {
        Effect::Join(JoinTarget::List(markers.into_iter().collect()))
    }

    pub fn join_keyed(markers: impl IntoIterator<Item = (String, TaskMarker)>) -> Effect {
        Effect::Join(JoinTarget::Keyed(markers.into_iter().collect()))
    }

    pub fn race(entries: impl IntoIterator<Item = (&'static str, Effect)>) -> Effect {
        Effect::Race(Entries::Keyed(
            entries.into_iter().map(|(k, e)| (k.to_string(), e)).collect(),
        ))
    }

    pub fn race_list(entries: impl IntoIterator<Item = Effect>) -> Effect {
        Effect::Race(Entries::List(entries.into_iter().collect()))
    }

    pub fn all(entries: impl IntoIterator<Item = (&'static str, Effect)>) -> Effect {
        Effect::All(Entries::Keyed(
            entries.into_iter().map(|(k, e)| (k.to_string(), e)).collect(),
        ))
    }

    pub fn all_list(entries: impl IntoIterator<Item = Effect>) -> Effect {
        Effect::All(Entries::List(entries.into_iter().collect()))
    }

    pub fn cancel(marker: TaskMarker) -> Effect {
        Effect::Cancel(marker)
    }

    pub fn is_cancelled() -> Effect {
        Effect::IsCancelled
    }

    pub fn external(kind: impl Into<String>, payload: Value) -> Effect {
        Effect::External {
            kind: kind.into(),
            payload,
        }
    }

    /// The tag name, for diagnostics.
    pub fn kind_name(&self) -> &str {
        match self {
            Effect::Fork(_) => "fork",
            Effect::Call(_) => "call",
            Effect::Join(_) => "join",
            Effect::Race(_) => "race",
            Effect::All(_) => "all",
            Effect::Cancel(_) => "cancel",
            Effect::IsCancelled => "is-cancelled",
            Effect::External { kind, .. } => kind,
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Fork(fork) => f
                .debug_struct("Fork")
                .field("name", &fork.name)
                .field("detached", &fork.detached)
                .field("tier", &fork.tier)
                .finish_non_exhaustive(),
            Effect::Call(call) => f
                .debug_struct("Call")
                .field("name", &call.name)
                .finish_non_exhaustive(),
            Effect::Join(JoinTarget::One(m)) => f.debug_tuple("Join").field(m).finish(),
            Effect::Join(JoinTarget::List(ms)) => f.debug_tuple("Join").field(ms).finish(),
            Effect::Join(JoinTarget::Keyed(ms)) => f.debug_tuple("Join").field(ms).finish(),
            Effect::Race(entries) => write!(f, "Race({} members)", entries.len()),
            Effect::All(entries) => write!(f, "All({} members)", entries.len()),
            Effect::Cancel(marker) => f.debug_tuple("Cancel").field(marker).finish(),
            Effect::IsCancelled => write!(f, "IsCancelled"),
            Effect::External { kind, payload } => f
                .debug_struct("External")
                .field("kind", kind)
                .field("payload", payload)
                .finish(),
        }
    }
}

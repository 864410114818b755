// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Interruptions: the record of why and on what a task is blocked.

use indexmap::IndexSet;
use weft_effects::{BlockKind, TaskId, Value};

/// One entry of a pending shape: still waiting on a task, or already
/// carrying its result.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Blocked(TaskId),
    Resolved(Value),
}

impl Slot {
    pub fn blocked_on(&self) -> Option<TaskId> {
        match self {
            Slot::Blocked(id) => Some(*id),
            Slot::Resolved(_) => None,
        }
    }
}

/// Mirror of the original blocking shape: a single reference, an ordered
/// list, or a keyed map. Result collapsing preserves this shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    Single(Slot),
    List(Vec<Slot>),
    Keyed(Vec<(String, Slot)>),
}

impl Pending {
    pub fn slots(&self) -> Box<dyn Iterator<Item = &Slot> + '_> {
        match self {
            Pending::Single(slot) => Box::new(std::iter::once(slot)),
            Pending::List(slots) => Box::new(slots.iter()),
            Pending::Keyed(entries) => Box::new(entries.iter().map(|(_, slot)| slot)),
        }
    }

    pub fn slots_mut(&mut self) -> Box<dyn Iterator<Item = &mut Slot> + '_> {
        match self {
            Pending::Single(slot) => Box::new(std::iter::once(slot)),
            Pending::List(slots) => Box::new(slots.iter_mut()),
            Pending::Keyed(entries) => Box::new(entries.iter_mut().map(|(_, slot)| slot)),
        }
    }

    pub fn all_resolved(&self) -> bool {
        self.slots().all(|slot| matches!(slot, Slot::Resolved(_)))
    }

    pub fn any_resolved(&self) -> bool {
        self.slots().any(|slot| matches!(slot, Slot::Resolved(_)))
    }

    /// Collapse into the resume value: a singleton yields its bare value,
    /// a list the ordered values, a keyed shape a map. Slots still blocked
    /// become `Null` (list) or are omitted (keyed) — the race contract.
    pub fn collapse(&self) -> Value {
        match self {
            Pending::Single(Slot::Resolved(value)) => value.clone(),
            Pending::Single(Slot::Blocked(_)) => Value::Null,
            Pending::List(slots) => Value::List(
                slots
                    .iter()
                    .map(|slot| match slot {
                        Slot::Resolved(value) => value.clone(),
                        Slot::Blocked(_) => Value::Null,
                    })
                    .collect(),
            ),
            Pending::Keyed(entries) => Value::Map(
                entries
                    .iter()
                    .filter_map(|(key, slot)| match slot {
                        Slot::Resolved(value) => Some((key.clone(), value.clone())),
                        Slot::Blocked(_) => None,
                    })
                    .collect(),
            ),
        }
    }

    /// Collapse keeping only the first resolved slot — the race winner.
    /// Losing entries become an absent value: `Null` in a list, omitted
    /// from a map.
    pub fn collapse_first(&self) -> Value {
        match self {
            Pending::Single(Slot::Resolved(value)) => value.clone(),
            Pending::Single(Slot::Blocked(_)) => Value::Null,
            Pending::List(slots) => {
                let winner = slots
                    .iter()
                    .position(|slot| matches!(slot, Slot::Resolved(_)));
                Value::List(
                    slots
                        .iter()
                        .enumerate()
                        .map(|(index, slot)| match slot {
                            Slot::Resolved(value) if Some(index) == winner => value.clone(),
                            _ => Value::Null,
                        })
                        .collect(),
                )
            }
            Pending::Keyed(entries) => Value::Map(
                entries
                    .iter()
                    .find_map(|(key, slot)| match slot {
                        Slot::Resolved(value) => Some((key.clone(), value.clone())),
                        Slot::Blocked(_) => None,
                    })
                    .into_iter()
                    .collect(),
            ),
        }
    }
}

/// Why a task cannot progress on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Interruption {
    pub kind: BlockKind,
    /// The original blocking shape, mixing resolved and blocked entries.
    pub pending: Pending,
    /// Flattened set of still-referenced task ids.
    pub dependencies: IndexSet<TaskId>,
    /// Set once the completion predicate holds; consumed exactly once on
    /// the owner's next run.
    pub resolved: bool,
    pub value: Option<Value>,
}

impl Interruption {
    pub fn new(kind: BlockKind, pending: Pending) -> Self {
        let dependencies: IndexSet<TaskId> =
            pending.slots().filter_map(Slot::blocked_on).collect();
        Self {
            kind,
            pending,
            dependencies,
            resolved: false,
            value: None,
        }
    }

    /// A block on every child draining; carries the value the coroutine
    /// already produced before idling.
    pub fn children(already_produced: Value) -> Self {
        Self {
            kind: BlockKind::Children,
            pending: Pending::Single(Slot::Resolved(already_produced.clone())),
            dependencies: IndexSet::new(),
            resolved: false,
            value: Some(already_produced),
        }
    }

    /// A block on a single dependency task.
    pub fn on_task(kind: BlockKind, dependency: TaskId) -> Self {
        Self::new(kind, Pending::Single(Slot::Blocked(dependency)))
    }

    pub fn mark_resolved(&mut self, value: Value) {
        self.resolved = true;
        self.value = Some(value);
    }

    /// The partially-resolved value, for dumps.
    pub fn partial_value(&self) -> Option<Value> {
        match self.kind {
            BlockKind::Children => self.value.clone(),
            BlockKind::Generator => None,
            _ if self.pending.any_resolved() => Some(self.pending.collapse()),
            _ => None,
        }
    }
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Wait tiers: the synthetic, non-wall-clock priority of a pending task.

/// Why a blocked task is blocked. Doubles as the label of its symbolic
/// wait tier, so dumps say *what* a task is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BlockKind {
    /// Inline call suspended into a directly forked child.
    Generator,
    /// Waiting on one or more referenced tasks.
    Join,
    /// First-of composite.
    Race,
    /// All-of composite.
    All,
    /// Coroutine finished but structural children are still live.
    Children,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BlockKind::Generator => "generator",
            BlockKind::Join => "join",
            BlockKind::Race => "race",
            BlockKind::All => "all",
            BlockKind::Children => "children",
        };
        write!(f, "{}", s)
    }
}

/// Scheduling tier of a task.
///
/// `Ready` and every `Blocked(_)` tier sort as "now" (equal-lowest);
/// `Tick(n)` sorts by value above "now"; `Idle` is the last resort and
/// only runs when nothing else can. A `Blocked` task is additionally
/// gated by its interruption: it never enters a batch until resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Wait {
    /// Runnable now (or finished, once the task leaves the pending set).
    Ready,
    /// Relative tick priority; lower runs sooner.
    Tick(u64),
    /// Lowest priority; runs only when no other tier is eligible.
    Idle,
    /// Symbolic tier of a blocked task; "now" once its interruption resolves.
    Blocked(BlockKind),
}

impl Wait {
    /// True for tiers that are "now"-equivalent for batch selection.
    pub fn is_now(&self) -> bool {
        matches!(self, Wait::Ready | Wait::Blocked(_))
    }

    pub fn tick(&self) -> Option<u64> {
        match self {
            Wait::Tick(n) => Some(*n),
            _ => None,
        }
    }
}

impl std::fmt::Display for Wait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Wait::Ready => write!(f, "now"),
            Wait::Tick(n) => write!(f, "tick {}", n),
            Wait::Idle => write!(f, "idle"),
            Wait::Blocked(kind) => write!(f, "{}-wait", kind),
        }
    }
}

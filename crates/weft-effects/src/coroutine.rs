// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The resumable-computation contract.
//!
//! Tested code is anything that can be resumed with a value (or have an
//! error thrown into it) and answers with its next suspension point.
//! Native generators, explicit state machines, and closure scripts all fit.

use crate::effect::Effect;
use crate::value::Value;

/// What a coroutine is resumed with.
#[derive(Debug)]
pub enum Resume {
    /// The value produced by the effect it was suspended on.
    Value(Value),
    /// An error thrown into the suspension point, so cleanup paths run.
    Failure(TestedError),
}

/// What a coroutine answers with.
pub enum Step {
    /// Suspended on the given effect descriptor.
    Yield(Effect),
    /// Completed with a final value.
    Done(Value),
    /// Raised (or re-raised) an error out of the coroutine.
    Raise(TestedError),
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Yield(effect) => f.debug_tuple("Yield").field(effect).finish(),
            Step::Done(value) => f.debug_tuple("Done").field(value).finish(),
            Step::Raise(err) => f.debug_tuple("Raise").field(err).finish(),
        }
    }
}

/// A cooperatively-suspended computation under test.
///
/// `resume` is called once per scheduler turn the task gets; the engine
/// never calls it again after `Done` or `Raise`.
pub trait Coroutine {
    fn resume(&mut self, input: Resume) -> Step;
}

/// An error raised by code under test. Opaque to the engine: it is thrown
/// into owning coroutines and propagated up the structural parent chain,
/// never interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestedError(pub String);

impl TestedError {
    pub fn new(message: impl Into<String>) -> Self {
        TestedError(message.into())
    }
}

impl std::fmt::Display for TestedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TestedError {}

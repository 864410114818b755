// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scripted coroutines: a step-list builder for expressing tested code in
//! scenarios without writing a state machine by hand.

use std::collections::VecDeque;

use weft_effects::{Coroutine, Effect, Resume, Step, TestedError, Value};

type StepFn = Box<dyn FnMut(Value) -> Step>;
type TrapFn = Box<dyn FnMut(TestedError) -> Step>;

/// A coroutine assembled from a list of step closures. Each closure
/// receives the value the previous suspension resumed with and answers
/// with the next step. When the steps run out, the script completes with
/// the last resume value. An optional trap receives errors thrown into
/// the script; without one, errors propagate out unchanged.
pub struct Script {
    steps: VecDeque<StepFn>,
    trap: Option<TrapFn>,
}

impl Script {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            trap: None,
        }
    }

    /// Append a step computed from the previous resume value.
    pub fn step(mut self, step: impl FnMut(Value) -> Step + 'static) -> Self {
        self.steps.push_back(Box::new(step));
        self
    }

    /// Append a step that yields a fixed effect, ignoring the resume value.
    pub fn effect(self, effect: Effect) -> Self {
        let mut effect = Some(effect);
        self.step(move |_| {
            Step::Yield(effect.take().expect("effect step resumed twice"))
        })
    }

    /// Append a final step completing with a fixed value.
    pub fn finish(self, value: Value) -> Self {
        let mut value = Some(value);
        self.step(move |_| Step::Done(value.take().expect("finish step resumed twice")))
    }

    /// Install an error trap, exercised when a failure is thrown into the
    /// script at a suspension point.
    pub fn trap(mut self, trap: impl FnMut(TestedError) -> Step + 'static) -> Self {
        self.trap = Some(Box::new(trap));
        self
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl Coroutine for Script {
    fn resume(&mut self, input: Resume) -> Step {
        match input {
            Resume::Value(value) => match self.steps.pop_front() {
                Some(mut step) => step(value),
                None => Step::Done(value),
            },
            Resume::Failure(err) => match self.trap.take() {
                Some(mut trap) => trap(err),
                None => Step::Raise(err),
            },
        }
    }
}

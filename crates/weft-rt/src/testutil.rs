// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Minimal scripted coroutine for engine unit tests. The harness crate
//! ships the full-featured builder; this one stays dependency-free.

use std::collections::VecDeque;

use weft_effects::{Coroutine, Resume, Step, TestedError, Value};

type StepFn = Box<dyn FnMut(Value) -> Step>;
type TrapFn = Box<dyn FnMut(TestedError) -> Step>;

pub(crate) struct Steps {
    steps: VecDeque<StepFn>,
    trap: Option<TrapFn>,
}

impl Steps {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            trap: None,
        }
    }

    pub fn then(mut self, step: impl FnMut(Value) -> Step + 'static) -> Self {
        self.steps.push_back(Box::new(step));
        self
    }

    pub fn trap(mut self, trap: impl FnMut(TestedError) -> Step + 'static) -> Self {
        self.trap = Some(Box::new(trap));
        self
    }
}

impl Coroutine for Steps {
    fn resume(&mut self, input: Resume) -> Step {
        match input {
            Resume::Value(value) => match self.steps.pop_front() {
                Some(mut step) => step(value),
                // Out of steps: echo the input back as the result.
                None => Step::Done(value),
            },
            Resume::Failure(err) => match self.trap.take() {
                Some(mut trap) => trap(err),
                None => Step::Raise(err),
            },
        }
    }
}

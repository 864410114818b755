// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Deterministic, single-threaded interpreter and scheduler for trees of
//! cooperatively-suspended tasks.
//!
//! No real clock, no real I/O, no threads: apparent concurrency is an
//! artifact of one deterministic ordering policy. Exactly one coroutine
//! runs at a time, to its next suspension point; blocked tasks wait on
//! explicit interruptions and are woken by the dependency resolver when
//! their dependencies complete. The deadlock guard turns genuine cycles
//! and runaway tested code into a fatal, fully-dumped error.

mod cancel;
mod config;
mod engine;
mod error;
mod guard;
mod handler;
mod interp;
mod interrupt;
pub mod priority;
mod registry;
mod resolver;
mod task;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{ConfigError, DetachedFailures, EngineConfig};
pub use engine::Engine;
pub use error::RunError;
pub use guard::{DeadlockError, DeadlockTrigger, Dump, DumpEntry};
pub use handler::{EffectHandler, HandlerCx, HandlerError, HandlerOutcome, NullHandler};
pub use interrupt::{Interruption, Pending, Slot};
pub use registry::TaskRegistry;
pub use task::Task;

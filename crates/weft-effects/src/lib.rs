// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Effect descriptors and the coroutine contract for the weft engine.
//!
//! Pure data: no scheduling logic lives here. Tested code is expressed as
//! [`Coroutine`]s that yield [`Effect`] descriptors and resume with injected
//! [`Value`]s or errors; the `weft-rt` crate interprets them.

mod coroutine;
mod effect;
mod value;
mod wait;

pub use coroutine::{Coroutine, Resume, Step, TestedError};
pub use effect::{CallEffect, Effect, Entries, ForkEffect, JoinTarget};
pub use value::{TaskId, TaskMarker, Value};
pub use wait::{BlockKind, Wait};

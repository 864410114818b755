// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Test harness around the weft engine: expectation-matching external
//! effect handling with call counting, external-occurrence emulation,
//! scripted coroutines for driving scenarios, and dump rendering.

pub mod effects;
mod expect;
mod occurrence;
pub mod report;
mod script;

pub use expect::{Expectation, Matcher, MockHandler, Response, SetupError, VerifyError};
pub use occurrence::OccurrenceBroker;
pub use script::Script;

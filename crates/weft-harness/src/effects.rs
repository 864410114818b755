// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Constructors for the external effect kinds the harness understands.

use weft_effects::{Effect, Value};

/// Reserved kind: virtual-time delay, payload is the tick count.
pub const DELAY: &str = "delay";
/// Reserved kind: wait for a named occurrence.
pub const AWAIT: &str = "await";
/// Reserved kind: fire a named occurrence.
pub const NOTIFY: &str = "notify";
/// Conventional kind for mocked calls matched by expectations.
pub const CALL: &str = "call";

/// Suspend for `ticks` virtual ticks.
pub fn delay(ticks: u64) -> Effect {
    Effect::external(DELAY, Value::Int(ticks as i64))
}

/// Wait until the named occurrence fires; resumes with the fired value.
pub fn await_occurrence(name: impl Into<String>) -> Effect {
    Effect::external(AWAIT, Value::Str(name.into()))
}

/// Fire the named occurrence, waking every waiter with `value`.
pub fn notify(name: impl Into<String>, value: Value) -> Effect {
    Effect::external(
        NOTIFY,
        Value::map([
            ("occurrence".to_string(), Value::Str(name.into())),
            ("value".to_string(), value),
        ]),
    )
}

/// A mocked call: `function` plus its arguments, matched by expectations.
pub fn invoke(function: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Effect {
    Effect::external(
        CALL,
        Value::map([
            ("function".to_string(), Value::Str(function.into())),
            ("args".to_string(), Value::list(args)),
        ]),
    )
}

/// The payload shape `invoke` produces, for building matchers.
pub fn call_payload(function: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Value {
    Value::map([
        ("function".to_string(), Value::Str(function.into())),
        ("args".to_string(), Value::list(args)),
    ])
}

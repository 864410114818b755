// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! External occurrence emulation.
//!
//! Occurrences are named, virtual events: tested code waits on a name and
//! other tested code (or the scenario itself) fires it with a value.
//! Waiting parks a synthetic task; firing completes every parked waiter.
//! A value fired with nobody waiting is queued and satisfies the next
//! waiter immediately — queue emulation for producer-before-consumer.

use std::collections::VecDeque;

use indexmap::IndexMap;
use weft_effects::{TaskId, Value};
use weft_rt::{HandlerCx, HandlerError, HandlerOutcome};

#[derive(Default)]
pub struct OccurrenceBroker {
    queued: IndexMap<String, VecDeque<Value>>,
    parked: IndexMap<String, Vec<TaskId>>,
}

impl OccurrenceBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a wait-for-occurrence effect: satisfied immediately from the
    /// queue, or parked until the occurrence fires.
    pub fn wait(
        &mut self,
        payload: &Value,
        cx: &mut HandlerCx<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let Value::Str(name) = payload else {
            return Err(HandlerError::Failed(format!(
                "await expects a string occurrence name, got {}",
                payload.type_name()
            )));
        };
        if let Some(value) = self
            .queued
            .get_mut(name)
            .and_then(|queue| queue.pop_front())
        {
            return Ok(HandlerOutcome::Advance(value));
        }
        let parked = cx.park(&format!("await:{}", name));
        self.parked.entry(name.clone()).or_default().push(parked);
        Ok(HandlerOutcome::Block(parked))
    }

    /// Handle a fire-occurrence effect: wake every parked waiter with the
    /// carried value, or queue it when nobody waits yet.
    pub fn fire(
        &mut self,
        payload: &Value,
        cx: &mut HandlerCx<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let (name, value) = match payload {
            Value::Map(entries) => {
                let name = match entries.get("occurrence") {
                    Some(Value::Str(name)) => name.clone(),
                    _ => {
                        return Err(HandlerError::Failed(
                            "notify expects an `occurrence` name entry".to_string(),
                        ))
                    }
                };
                let value = entries.get("value").cloned().unwrap_or(Value::Null);
                (name, value)
            }
            Value::Str(name) => (name.clone(), Value::Null),
            other => {
                return Err(HandlerError::Failed(format!(
                    "notify expects a map or string payload, got {}",
                    other.type_name()
                )))
            }
        };

        let waiters = self.parked.shift_remove(&name).unwrap_or_default();
        if waiters.is_empty() {
            self.queued.entry(name).or_default().push_back(value);
        } else {
            for waiter in waiters {
                cx.complete(waiter, value.clone());
            }
        }
        Ok(HandlerOutcome::Advance(Value::Null))
    }
}

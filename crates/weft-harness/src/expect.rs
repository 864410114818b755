// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expectation matching for opaque effects.
//!
//! Expectations are declared up front, matched first-wins against each
//! external effect a run yields, and verified after the run completes.
//! Verification failures never affect scheduling: they are aggregated and
//! raised once the run is over.

use weft_effects::{TestedError, Value};
use weft_rt::{EffectHandler, HandlerCx, HandlerError, HandlerOutcome};

use crate::effects;
use crate::occurrence::OccurrenceBroker;

/// How an expectation decides whether a payload is for it. Equality is
/// structural; anything richer is out of scope by design.
#[derive(Debug, Clone)]
pub enum Matcher {
    Any,
    Equals(Value),
}

impl Matcher {
    fn matches(&self, payload: &Value) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Equals(expected) => expected == payload,
        }
    }
}

/// What a matched effect does to the yielding task.
#[derive(Debug, Clone)]
pub enum Response {
    /// Advance with this value.
    Value(Value),
    /// Advance with this value after the given number of virtual ticks.
    AfterTicks(u64, Value),
    /// Throw a tested-code error into the yielding coroutine.
    Fail(String),
}

/// One configured expectation: an effect kind, a payload matcher, a
/// response, and the allowed call range.
#[derive(Debug, Clone)]
pub struct Expectation {
    kind: String,
    matcher: Matcher,
    response: Response,
    min_calls: u64,
    max_calls: Option<u64>,
    calls: u64,
}

impl Expectation {
    /// Expect effects of the given kind, any payload, responding `Null`.
    pub fn on(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            matcher: Matcher::Any,
            response: Response::Value(Value::Null),
            min_calls: 0,
            max_calls: None,
            calls: 0,
        }
    }

    /// Expect a mocked call to `function` with exactly these arguments.
    pub fn call(function: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        Self::on(effects::CALL).equals(effects::call_payload(function, args))
    }

    pub fn equals(mut self, payload: Value) -> Self {
        self.matcher = Matcher::Equals(payload);
        self
    }

    pub fn matching(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn returns(mut self, value: Value) -> Self {
        self.response = Response::Value(value);
        self
    }

    /// Resolve after `ticks` virtual ticks, like a mocked slow call.
    pub fn after_ticks(mut self, ticks: u64, value: Value) -> Self {
        self.response = Response::AfterTicks(ticks, value);
        self
    }

    /// Throw a tested-code error into the caller instead of resolving.
    pub fn fails(mut self, message: impl Into<String>) -> Self {
        self.response = Response::Fail(message.into());
        self
    }

    /// Require exactly `n` calls.
    pub fn times(mut self, n: u64) -> Self {
        self.min_calls = n;
        self.max_calls = Some(n);
        self
    }

    pub fn at_least(mut self, n: u64) -> Self {
        self.min_calls = n;
        self
    }

    pub fn at_most(mut self, n: u64) -> Self {
        self.max_calls = Some(n);
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    fn exhausted(&self) -> bool {
        self.max_calls.is_some_and(|max| self.calls >= max)
    }

    fn describe(&self) -> String {
        match &self.matcher {
            Matcher::Any => format!("`{}` (any payload)", self.kind),
            Matcher::Equals(payload) => format!("`{}` {}", self.kind, payload),
        }
    }
}

/// Malformed harness configuration, fatal before the run starts.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("expectation {0} allows at most {1} call(s) but requires at least {2}")]
    InvertedCallBounds(String, u64, u64),
}

/// Unmet expectations, aggregated after a completed run.
#[derive(Debug, thiserror::Error)]
#[error("{} expectation(s) unmet:\n{}", .failures.len(), .failures.join("\n"))]
pub struct VerifyError {
    pub failures: Vec<String>,
}

/// The harness's external effect handler: reserved kinds (delay, await,
/// notify) are emulated internally, everything else is matched against
/// the configured expectations, first match wins.
#[derive(Default)]
pub struct MockHandler {
    expectations: Vec<Expectation>,
    broker: OccurrenceBroker,
}

impl MockHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    /// Check the configuration before a run. Fatal, never retried.
    pub fn validate(&self) -> Result<(), SetupError> {
        for expectation in &self.expectations {
            if let Some(max) = expectation.max_calls {
                if max < expectation.min_calls {
                    return Err(SetupError::InvertedCallBounds(
                        expectation.describe(),
                        max,
                        expectation.min_calls,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Aggregate unmet expectations. Call after the run; the result never
    /// influences scheduling.
    pub fn verify(&self) -> Result<(), VerifyError> {
        let failures: Vec<String> = self
            .expectations
            .iter()
            .filter(|expectation| expectation.calls < expectation.min_calls)
            .map(|expectation| {
                format!(
                    "  {} expected at least {} call(s), got {}",
                    expectation.describe(),
                    expectation.min_calls,
                    expectation.calls
                )
            })
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(VerifyError { failures })
        }
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    fn dispatch(
        &mut self,
        kind: &str,
        payload: &Value,
        cx: &mut HandlerCx<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let matched = self.expectations.iter_mut().find(|expectation| {
            expectation.kind == kind && !expectation.exhausted() && expectation.matcher.matches(payload)
        });
        let Some(expectation) = matched else {
            let marker = cx.owner_marker();
            return Err(HandlerError::Unmatched {
                kind: kind.to_string(),
                payload: payload.clone(),
                task: marker.id,
                name: marker.name,
            });
        };
        expectation.calls += 1;
        match expectation.response.clone() {
            Response::Value(value) => Ok(HandlerOutcome::Advance(value)),
            Response::AfterTicks(ticks, value) => {
                let dep = cx.delay(ticks, value);
                Ok(HandlerOutcome::Block(dep))
            }
            Response::Fail(message) => Ok(HandlerOutcome::Fail(TestedError::new(message))),
        }
    }
}

impl EffectHandler for MockHandler {
    fn handle(
        &mut self,
        kind: &str,
        payload: &Value,
        cx: &mut HandlerCx<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        match kind {
            effects::DELAY => {
                let Value::Int(ticks) = payload else {
                    return Err(HandlerError::Failed(format!(
                        "delay expects an integer tick count, got {}",
                        payload.type_name()
                    )));
                };
                let dep = cx.delay(u64::try_from(*ticks).unwrap_or(0), Value::Null);
                Ok(HandlerOutcome::Block(dep))
            }
            effects::AWAIT => self.broker.wait(payload, cx),
            effects::NOTIFY => self.broker.fire(payload, cx),
            _ => self.dispatch(kind, payload, cx),
        }
    }
}

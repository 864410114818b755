// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Inline-call scenarios: synchronous completion, suspension into a
//! generator wait, and failure re-entry.

use weft_effects::{Effect, Step, TaskId, Value};
use weft_harness::Script;
use weft_rt::{Engine, EngineConfig};

#[test]
fn inline_call_completes_in_the_same_slot() {
    let sub = Script::new().finish(Value::Int(5));
    let mut sub = Some(sub);
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::call("sub", sub.take().unwrap())))
        .step(Step::Done);

    let mut engine = Engine::new(EngineConfig::default());
    let result = engine.run(Box::new(root)).unwrap();
    assert_eq!(result, Value::Int(5));
    // No task was ever created for the inline call.
    assert!(engine.registry().get(TaskId(1)).is_none());
}

#[test]
fn blocked_inline_call_suspends_into_a_child_task() {
    let sub = Script::new()
        .effect(Effect::fork_at(
            "helper",
            2,
            Script::new().finish(Value::Int(7)),
        ))
        .step(|marker| {
            let marker = marker.as_task().unwrap().clone();
            Step::Yield(Effect::join(marker))
        })
        .step(Step::Done);

    let mut sub = Some(sub);
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::call("sub", sub.take().unwrap())))
        .step(Step::Done);

    let mut engine = Engine::new(EngineConfig::default());
    let result = engine.run(Box::new(root)).unwrap();
    assert_eq!(result, Value::Int(7));

    // The suspended remainder became a real task named after the call.
    let sub_task = engine.registry().get(TaskId(2)).expect("suspended call task");
    assert_eq!(sub_task.name, "sub");
    assert!(sub_task.finished);
    assert_eq!(sub_task.result, Some(Value::Int(7)));
}

#[test]
fn nested_inline_calls_collapse_to_the_innermost_result() {
    let inner = Script::new().finish(Value::Int(3));
    let mut inner = Some(inner);
    let outer = Script::new()
        .step(move |_| Step::Yield(Effect::call("inner", inner.take().unwrap())))
        .step(Step::Done);
    let mut outer = Some(outer);
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::call("outer", outer.take().unwrap())))
        .step(Step::Done);

    let result = Engine::new(EngineConfig::default())
        .run(Box::new(root))
        .unwrap();
    assert_eq!(result, Value::Int(3));
}

#[test]
fn inline_failure_is_rethrown_into_the_caller() {
    let sub = Script::new().step(|_| {
        Step::Raise(weft_effects::TestedError::new("inline boom"))
    });
    let mut sub = Some(sub);
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::call("sub", sub.take().unwrap())))
        .step(|_| Step::Done(Value::Null))
        .trap(|err| Step::Done(Value::str(format!("handled: {}", err))));

    let result = Engine::new(EngineConfig::default())
        .run(Box::new(root))
        .unwrap();
    assert_eq!(result, Value::from("handled: inline boom"));
}

#[test]
fn inline_cleanup_runs_before_the_error_escapes() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let cleaned: Rc<RefCell<bool>> = Rc::new(RefCell::new(false));

    // The inline body forks a failing task and joins it; the join is the
    // suspension point the error is thrown back into, and the body's trap
    // runs its cleanup before re-raising.
    let cleaned_in_sub = cleaned.clone();
    let sub = Script::new()
        .effect(Effect::fork(
            "failing",
            Script::new().step(|_| Step::Raise(weft_effects::TestedError::new("deep boom"))),
        ))
        .step(|marker| {
            let marker = marker.as_task().unwrap().clone();
            Step::Yield(Effect::join(marker))
        })
        .step(|_| Step::Done(Value::Null))
        .trap(move |err| {
            *cleaned_in_sub.borrow_mut() = true;
            Step::Raise(err)
        });

    let mut sub = Some(sub);
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::call("sub", sub.take().unwrap())))
        .step(|_| Step::Done(Value::Null))
        .trap(|err| Step::Done(Value::str(format!("root saw: {}", err))));

    let result = Engine::new(EngineConfig::default())
        .run(Box::new(root))
        .unwrap();
    assert_eq!(result, Value::from("root saw: deep boom"));
    assert!(*cleaned.borrow());
}

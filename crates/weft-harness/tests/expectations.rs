// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expectation matching, call counting, and occurrence emulation.

use std::cell::RefCell;
use std::rc::Rc;

use weft_effects::{Effect, Step, Value};
use weft_harness::{effects, Expectation, MockHandler, Script};
use weft_rt::{Engine, EngineConfig, HandlerError, RunError};

#[test]
fn matched_calls_resolve_in_declaration_order() {
    let handler = MockHandler::new()
        .expect(
            Expectation::call("fetch", [Value::Int(1)])
                .returns(Value::from("one"))
                .times(1),
        )
        .expect(
            Expectation::call("fetch", [Value::Int(2)])
                .returns(Value::from("two"))
                .times(1),
        );
    handler.validate().unwrap();

    let root = Script::new()
        .effect(effects::invoke("fetch", [Value::Int(1)]))
        .step(|first| {
            assert_eq!(first, Value::from("one"));
            Step::Yield(effects::invoke("fetch", [Value::Int(2)]))
        })
        .step(Step::Done);

    let mut engine = Engine::with_handler(EngineConfig::default(), handler);
    let result = engine.run(Box::new(root)).unwrap();
    assert_eq!(result, Value::from("two"));
    engine.handler().verify().unwrap();
}

#[test]
fn unmatched_effect_is_fatal_with_full_context() {
    let root = Script::new()
        .effect(effects::invoke("launch", [Value::from("now")]))
        .step(Step::Done);

    let mut engine = Engine::with_handler(EngineConfig::default(), MockHandler::new());
    let err = engine.run(Box::new(root)).unwrap_err();
    let RunError::Handler(HandlerError::Unmatched {
        kind,
        payload,
        task,
        name,
    }) = err
    else {
        panic!("expected an unmatched effect, got {:?}", err);
    };
    assert_eq!(kind, effects::CALL);
    assert_eq!(name, "root");
    assert_eq!(task.0, 0);
    assert!(format!("{}", payload).contains("launch"));
}

#[test]
fn undercalled_expectation_fails_verification_after_the_run() {
    let handler = MockHandler::new().expect(
        Expectation::call("ping", [])
            .returns(Value::Null)
            .times(2),
    );

    let root = Script::new()
        .effect(effects::invoke("ping", []))
        .step(|_| Step::Done(Value::Null));

    let mut engine = Engine::with_handler(EngineConfig::default(), handler);
    engine.run(Box::new(root)).unwrap();

    let err = engine.handler().verify().unwrap_err();
    assert_eq!(err.failures.len(), 1);
    assert!(err.failures[0].contains("ping"));
    assert!(err.failures[0].contains("got 1"));
}

#[test]
fn delayed_response_interleaves_with_virtual_time() {
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let quick_log = log.clone();
    let quick = Script::new().step(move |_| {
        quick_log.borrow_mut().push("quick".to_string());
        Step::Done(Value::Null)
    });

    let handler = MockHandler::new().expect(
        Expectation::call("slow", [])
            .after_ticks(5, Value::from("slow-done"))
            .times(1),
    );

    let resume_log = log.clone();
    let mut quick = Some(quick);
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::fork_at("quick", 3, quick.take().unwrap())))
        .step(|_| Step::Yield(effects::invoke("slow", [])))
        .step(move |value| {
            assert_eq!(value, Value::from("slow-done"));
            resume_log.borrow_mut().push("slow resumed".to_string());
            Step::Done(Value::Null)
        });

    let mut engine = Engine::with_handler(EngineConfig::default(), handler);
    engine.run(Box::new(root)).unwrap();

    // The tick-3 fork runs before the tick-5 mocked response resolves.
    assert_eq!(*log.borrow(), vec!["quick", "slow resumed"]);
}

#[test]
fn failing_response_is_thrown_into_the_caller() {
    let handler =
        MockHandler::new().expect(Expectation::call("explode", []).fails("kaboom").times(1));

    let root = Script::new()
        .effect(effects::invoke("explode", []))
        .step(|_| Step::Done(Value::Null))
        .trap(|err| Step::Done(Value::str(format!("trapped: {}", err))));

    let mut engine = Engine::with_handler(EngineConfig::default(), handler);
    let result = engine.run(Box::new(root)).unwrap();
    assert_eq!(result, Value::from("trapped: kaboom"));
    engine.handler().verify().unwrap();
}

#[test]
fn occurrence_wakes_a_parked_waiter() {
    let waiter = Script::new()
        .effect(effects::await_occurrence("go"))
        .step(Step::Done);
    let notifier = Script::new()
        .effect(effects::notify("go", Value::Int(42)))
        .finish(Value::Null);

    let waiter_cell: Rc<RefCell<Option<weft_effects::TaskMarker>>> = Rc::new(RefCell::new(None));
    let waiter_store = waiter_cell.clone();
    let (mut waiter, mut notifier) = (Some(waiter), Some(notifier));
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::fork("waiter", waiter.take().unwrap())))
        .step(move |marker| {
            *waiter_store.borrow_mut() = Some(marker.as_task().unwrap().clone());
            Step::Yield(Effect::fork_at("notifier", 5, notifier.take().unwrap()))
        })
        .step(move |_| Step::Yield(Effect::join(waiter_cell.borrow().clone().unwrap())))
        .step(Step::Done);

    let mut engine = Engine::with_handler(EngineConfig::default(), MockHandler::new());
    let result = engine.run(Box::new(root)).unwrap();
    assert_eq!(result, Value::Int(42));
}

#[test]
fn occurrence_fired_first_satisfies_the_next_waiter() {
    let notifier = Script::new()
        .effect(effects::notify("ready", Value::Int(7)))
        .finish(Value::Null);
    let waiter = Script::new()
        .effect(effects::await_occurrence("ready"))
        .step(Step::Done);

    let (mut waiter, mut notifier) = (Some(waiter), Some(notifier));
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::fork("notifier", notifier.take().unwrap())))
        .step(move |_| Step::Yield(Effect::fork_at("waiter", 5, waiter.take().unwrap())))
        .step(move |marker| {
            let waiter_marker = marker.as_task().unwrap().clone();
            Step::Yield(Effect::join(waiter_marker))
        })
        .step(Step::Done);

    let mut engine = Engine::with_handler(EngineConfig::default(), MockHandler::new());
    let result = engine.run(Box::new(root)).unwrap();
    assert_eq!(result, Value::Int(7));
}

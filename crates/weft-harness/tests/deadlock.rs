// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Deadlock guard scenarios: genuine cycles and runaway tested code.

use std::cell::RefCell;
use std::rc::Rc;

use weft_effects::{Coroutine, Effect, Resume, Step, TaskMarker};
use weft_harness::{report, Script};
use weft_rt::{DeadlockTrigger, Engine, EngineConfig, RunError};

type MarkerCell = Rc<RefCell<Option<TaskMarker>>>;

#[test]
fn cyclic_join_stalls_and_dumps_every_pending_task() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let a_cell: MarkerCell = Rc::new(RefCell::new(None));
    let b_cell: MarkerCell = Rc::new(RefCell::new(None));

    // `a` joins `b` and vice versa; both markers exist before either task
    // runs because the root forks them at tick 1.
    let b_for_a = b_cell.clone();
    let a = Script::new()
        .step(move |_| Step::Yield(Effect::join(b_for_a.borrow().clone().unwrap())))
        .step(Step::Done);
    let a_for_b = a_cell.clone();
    let b = Script::new()
        .step(move |_| Step::Yield(Effect::join(a_for_b.borrow().clone().unwrap())))
        .step(Step::Done);

    let a_store = a_cell.clone();
    let a_for_join = a_cell.clone();
    let b_store = b_cell.clone();
    let (mut a, mut b) = (Some(a), Some(b));
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::fork_at("a", 1, a.take().unwrap())))
        .step(move |marker| {
            *a_store.borrow_mut() = Some(marker.as_task().unwrap().clone());
            Step::Yield(Effect::fork_at("b", 1, b.take().unwrap()))
        })
        .step(move |marker| {
            let b_marker = marker.as_task().unwrap().clone();
            *b_store.borrow_mut() = Some(b_marker.clone());
            let a_marker = a_for_join.borrow().clone().unwrap();
            Step::Yield(Effect::join_list([a_marker, b_marker]))
        })
        .step(Step::Done);

    let mut engine = Engine::new(EngineConfig::default());
    let err = engine.run(Box::new(root)).unwrap_err();
    let RunError::Deadlock(deadlock) = err else {
        panic!("expected a deadlock, got {:?}", err);
    };
    assert_eq!(deadlock.trigger, DeadlockTrigger::Stall);

    let names: Vec<&str> = deadlock
        .dump
        .entries
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    assert!(names.contains(&"root"));
    assert!(names.contains(&"a"));
    assert!(names.contains(&"b"));

    // Each side of the cycle names the other as its dependency.
    let a_entry = deadlock.dump.entries.iter().find(|e| e.name == "a").unwrap();
    let b_entry = deadlock.dump.entries.iter().find(|e| e.name == "b").unwrap();
    assert_eq!(a_entry.dependencies, vec![b_entry.id]);
    assert_eq!(b_entry.dependencies, vec![a_entry.id]);

    // Well under the ceiling: this is cycle detection, not step exhaustion.
    assert!(engine.steps() < EngineConfig::default().step_ceiling);
}

#[test]
fn step_ceiling_aborts_runaway_code_with_a_dump() {
    struct Spin;
    impl Coroutine for Spin {
        fn resume(&mut self, _input: Resume) -> Step {
            Step::Yield(Effect::is_cancelled())
        }
    }

    let mut engine = Engine::new(EngineConfig {
        step_ceiling: 64,
        ..EngineConfig::default()
    });
    let err = engine.run(Box::new(Spin)).unwrap_err();
    let RunError::Deadlock(deadlock) = err else {
        panic!("expected a deadlock, got {:?}", err);
    };
    assert_eq!(deadlock.trigger, DeadlockTrigger::StepCeiling);
    assert!(deadlock.dump.header.contains("step ceiling"));
}

#[test]
fn dump_renders_for_terminals_and_json() {
    let waiter = Script::new()
        .effect(weft_harness::effects::await_occurrence("never"))
        .step(Step::Done);

    let mut waiter = Some(waiter);
    let root = Script::new()
        .step(move |_| Step::Yield(Effect::fork("waiter", waiter.take().unwrap())))
        .step(|marker| {
            let marker = marker.as_task().unwrap().clone();
            Step::Yield(Effect::join(marker))
        })
        .step(Step::Done);

    let mut engine =
        Engine::with_handler(EngineConfig::default(), weft_harness::MockHandler::new());
    let err = engine.run(Box::new(root)).unwrap_err();
    let dump = err.dump().expect("deadlock carries a dump");

    colored::control::set_override(false);
    let text = report::render_dump(dump);
    assert!(text.contains("waiter"));
    assert!(text.contains("await:never"));

    let json = report::dump_to_json(dump);
    let tasks = json["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), dump.entries.len());
    assert!(tasks.iter().any(|task| task["name"] == "await:never"));
}

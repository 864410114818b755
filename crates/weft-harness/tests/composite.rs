// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Composite (all/race) effect scenarios, including synthetic placeholder
//! members.

use std::cell::RefCell;
use std::rc::Rc;

use weft_effects::{Effect, Step, TaskMarker, Value};
use weft_harness::Script;
use weft_rt::{Engine, EngineConfig};

type MarkerCell = Rc<RefCell<Option<TaskMarker>>>;

fn cell() -> MarkerCell {
    Rc::new(RefCell::new(None))
}

#[test]
fn all_resumes_once_every_member_resolves() {
    let a_cell = cell();
    let a_store = a_cell.clone();

    let root = Script::new()
        .effect(Effect::fork_at("a", 5, Script::new().finish(Value::Int(1))))
        .step(move |marker| {
            *a_store.borrow_mut() = Some(marker.as_task().unwrap().clone());
            Step::Yield(Effect::fork_at("b", 3, Script::new().finish(Value::Int(2))))
        })
        .step(move |marker| {
            let b = marker.as_task().unwrap().clone();
            let a = a_cell.borrow().clone().unwrap();
            Step::Yield(Effect::all([
                ("a", Effect::join(a)),
                ("b", Effect::join(b)),
            ]))
        })
        .step(Step::Done);

    let result = Engine::new(EngineConfig::default())
        .run(Box::new(root))
        .unwrap();
    // Declaration order, not completion order (b finished first).
    assert_eq!(
        result,
        Value::map([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
        ])
    );
}

#[test]
fn all_of_immediate_members_advances_without_blocking() {
    let root = Script::new()
        .effect(Effect::all_list([
            Effect::is_cancelled(),
            Effect::is_cancelled(),
        ]))
        .step(Step::Done);

    let mut engine = Engine::new(EngineConfig::default());
    let result = engine.run(Box::new(root)).unwrap();
    assert_eq!(
        result,
        Value::list([Value::Bool(false), Value::Bool(false)])
    );
    // Nothing was ever forked or parked for it.
    assert!(engine.registry().get(weft_effects::TaskId(1)).is_none());
}

#[test]
fn race_with_an_immediate_member_wins_instantly_and_cancels_the_rest() {
    let loser_cell = cell();
    let loser_store = loser_cell.clone();

    let root = Script::new()
        .effect(Effect::fork_at(
            "pending",
            30,
            Script::new().finish(Value::from("late")),
        ))
        .step(move |marker| {
            let pending = marker.as_task().unwrap().clone();
            *loser_store.borrow_mut() = Some(pending.clone());
            Step::Yield(Effect::race_list([
                Effect::is_cancelled(),
                Effect::join(pending),
            ]))
        })
        .step(Step::Done);

    let mut engine = Engine::new(EngineConfig::default());
    let result = engine.run(Box::new(root)).unwrap();
    // Index 0 won; the losing slot is absent.
    assert_eq!(result, Value::list([Value::Bool(false), Value::Null]));

    let loser_id = loser_cell.borrow().as_ref().unwrap().id;
    assert!(engine.registry().get(loser_id).unwrap().cancelled);
}

#[test]
fn multi_dependency_race_member_runs_through_a_placeholder() {
    let x_cell = cell();
    let y_cell = cell();
    let (x_store, y_store) = (x_cell.clone(), y_cell.clone());

    let root = Script::new()
        .effect(Effect::fork_at("x", 10, Script::new().finish(Value::from("x"))))
        .step(move |marker| {
            *x_store.borrow_mut() = Some(marker.as_task().unwrap().clone());
            Step::Yield(Effect::fork_at("y", 20, Script::new().finish(Value::from("y"))))
        })
        .step(move |marker| {
            *y_store.borrow_mut() = Some(marker.as_task().unwrap().clone());
            Step::Yield(Effect::fork_at("z", 5, Script::new().finish(Value::from("z"))))
        })
        .step(move |marker| {
            let z = marker.as_task().unwrap().clone();
            let x = x_cell.borrow().clone().unwrap();
            let y = y_cell.borrow().clone().unwrap();
            Step::Yield(Effect::race([
                ("pair", Effect::join_list([x, y])),
                ("solo", Effect::join(z)),
            ]))
        })
        .step(Step::Done);

    let mut engine = Engine::new(EngineConfig::default());
    let result = engine.run(Box::new(root)).unwrap();
    assert_eq!(
        result,
        Value::map([("solo".to_string(), Value::from("z"))])
    );

    // The pair placeholder lost and was cancelled, but the tasks it merely
    // referenced were not: they ran to completion on their own ticks.
    let registry = engine.registry();
    let x_id = registry.get(weft_effects::TaskId(1)).unwrap().id;
    let y_id = weft_effects::TaskId(2);
    assert!(!registry.get(x_id).unwrap().cancelled);
    assert!(!registry.get(y_id).unwrap().cancelled);
    assert_eq!(registry.get(x_id).unwrap().result, Some(Value::from("x")));
    assert_eq!(registry.get(y_id).unwrap().result, Some(Value::from("y")));
    assert_eq!(registry.pending_len(), 0);
}

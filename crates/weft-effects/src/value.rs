// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Dynamic values exchanged between the engine and tested code.

use indexmap::IndexMap;

/// Identity of a task in the run arena. Monotonically increasing, never
/// reused within a run. The root task is always id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TaskId(pub u64);

impl TaskId {
    /// The root task of every run.
    pub const ROOT: TaskId = TaskId(0);
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only reference to a forked task, handed back to tested code so
/// later join/cancel effects can name it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TaskMarker {
    pub id: TaskId,
    pub name: String,
}

impl std::fmt::Display for TaskMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

/// The value universe the engine moves around: resume inputs, task results,
/// external-effect payloads. Structural equality is all the engine ever
/// relies on; richer matching belongs to the harness.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    /// Insertion-ordered so rendering and equality are deterministic.
    Map(IndexMap<String, Value>),
    Task(TaskMarker),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(items.into_iter().collect())
    }

    pub fn map(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Map(entries.into_iter().collect())
    }

    /// The marker inside a `Value::Task`, if that is what this is.
    pub fn as_task(&self) -> Option<&TaskMarker> {
        match self {
            Value::Task(marker) => Some(marker),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Task(_) => "task",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Task(marker) => write!(f, "{}", marker),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<TaskMarker> for Value {
    fn from(marker: TaskMarker) -> Self {
        Value::Task(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested() {
        let v = Value::map([
            ("id".to_string(), Value::Int(3)),
            ("tags".to_string(), Value::list([Value::from("a"), Value::from("b")])),
        ]);
        assert_eq!(format!("{}", v), r#"{id: 3, tags: ["a", "b"]}"#);
    }

    #[test]
    fn map_equality_is_order_sensitive_on_iteration_not_equality() {
        let a = Value::map([("x".into(), Value::Int(1)), ("y".into(), Value::Int(2))]);
        let b = Value::map([("y".into(), Value::Int(2)), ("x".into(), Value::Int(1))]);
        // IndexMap equality is order-insensitive; display order differs.
        assert_eq!(a, b);
        assert_ne!(format!("{}", a), format!("{}", b));
    }
}

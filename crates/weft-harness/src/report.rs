// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Dump rendering: colored terminal output and machine-readable JSON.
//!
//! The engine fixes the field set — id, name, wait, dependencies, partial
//! value — and leaves rendering to this module.

use colored::Colorize;
use serde::Serialize;
use weft_effects::Value;
use weft_rt::Dump;

/// Render a pending dump for terminal consumption.
pub fn render_dump(dump: &Dump) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", dump.header.red().bold()));
    for entry in &dump.entries {
        let deps = if entry.dependencies.is_empty() {
            "-".to_string()
        } else {
            entry
                .dependencies
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        out.push_str(&format!(
            "  {} {}  {}  deps: {}",
            entry.id.to_string().cyan(),
            entry.name.bold(),
            entry.wait.to_string().yellow(),
            deps
        ));
        if let Some(partial) = &entry.partial_value {
            out.push_str(&format!("  partial: {}", partial));
        }
        out.push('\n');
    }
    out
}

/// One dumped task in JSON form. Mirrors the engine's fixed field set.
#[derive(Debug, Serialize)]
struct JsonTask<'a> {
    id: u64,
    name: &'a str,
    wait: String,
    dependencies: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partial_value: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct JsonDump<'a> {
    header: &'a str,
    tasks: Vec<JsonTask<'a>>,
}

/// Serialize a dump for IDEs and log scrapers.
pub fn dump_to_json(dump: &Dump) -> serde_json::Value {
    let report = JsonDump {
        header: &dump.header,
        tasks: dump
            .entries
            .iter()
            .map(|entry| JsonTask {
                id: entry.id.0,
                name: &entry.name,
                wait: entry.wait.to_string(),
                dependencies: entry.dependencies.iter().map(|id| id.0).collect(),
                partial_value: entry.partial_value.as_ref(),
            })
            .collect(),
    };
    serde_json::to_value(report).expect("dump serialization is infallible")
}

//! Textual rendering of instances and values.
//!
//! Output reads like a constructor call: `Point(x: 1, y: 2)`, and for union
//! instances `Shape.Circle(radius: 1)`. A group (instance, array or object)
//! stays on one line when it fits in `max_width` from the column it starts
//! at. Otherwise every entry goes on its own line, one indent level deeper,
//! and the closing delimiter gets a line of its own:
//!
//! ```text
//! Order(
//!     id: "ord_0001",
//!     lines: [Line(sku: "A-1", quantity: 2), Line(sku: "B-7", quantity: 1)],
//!     placed: 2024-03-01T09:30:00.000Z
//! )
//! ```

use chrono::SecondsFormat;
use serde_json::Value as Json;

use crate::config::FormatConfig;
use crate::parser::is_identifier;
use crate::value::{Instance, Value};

/// Renders values using a [`FormatConfig`] layout policy.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    config: FormatConfig,
}

struct Group<'v> {
    head: String,
    open: &'static str,
    close: &'static str,
    entries: Vec<(String, &'v Value)>,
}

impl Formatter {
    pub fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Render `type_name(field: value, ...)` for the given present fields.
    pub fn render(&self, type_name: &str, fields: &[(&str, &Value)]) -> String {
        let group = Group {
            head: type_name.to_string(),
            open: "(",
            close: ")",
            entries: fields
                .iter()
                .map(|(name, value)| (format!("{name}: "), *value))
                .collect(),
        };
        self.layout_group(&group, 0, 0, 0)
    }

    pub fn render_instance(&self, instance: &Instance) -> String {
        self.layout(&Value::Instance(instance.clone()), 0, 0, 0)
    }

    pub fn render_value(&self, value: &Value) -> String {
        self.layout(value, 0, 0, 0)
    }

    /// Render `value` starting at `column`, on a line indented by `indent`.
    /// `trailing` columns follow it on the same line (a separating comma).
    fn layout(&self, value: &Value, indent: usize, column: usize, trailing: usize) -> String {
        match group_of(value) {
            Some(group) => self.layout_group(&group, indent, column, trailing),
            None => scalar_text(value),
        }
    }

    fn layout_group(&self, group: &Group<'_>, indent: usize, column: usize, trailing: usize) -> String {
        let flat = flat_group(group);
        if group.entries.is_empty() || column + flat.chars().count() + trailing <= self.config.max_width {
            return flat;
        }

        let inner = indent + self.config.indent;
        let pad = " ".repeat(inner);
        let mut out = format!("{}{}\n", group.head, group.open);

        for (i, (label, value)) in group.entries.iter().enumerate() {
            let last = i + 1 == group.entries.len();
            out.push_str(&pad);
            out.push_str(label);
            out.push_str(&self.layout(
                value,
                inner,
                inner + label.chars().count(),
                usize::from(!last),
            ));
            if !last {
                out.push(',');
            }
            out.push('\n');
        }

        out.push_str(&" ".repeat(indent));
        out.push_str(group.close);
        out
    }
}

fn group_of(value: &Value) -> Option<Group<'_>> {
    match value {
        Value::Instance(instance) => Some(Group {
            head: instance.qualified_name(),
            open: "(",
            close: ")",
            entries: instance
                .fields()
                .map(|(name, value)| (format!("{name}: "), value))
                .collect(),
        }),
        Value::Array(items) => Some(Group {
            head: String::new(),
            open: "[",
            close: "]",
            entries: items.iter().map(|item| (String::new(), item)).collect(),
        }),
        Value::Object(map) => Some(Group {
            head: String::new(),
            open: "{",
            close: "}",
            entries: map
                .iter()
                .map(|(key, value)| (format!("{}: ", object_key(key)), value))
                .collect(),
        }),
        _ => None,
    }
}

fn flat(value: &Value) -> String {
    match group_of(value) {
        Some(group) => flat_group(&group),
        None => scalar_text(value),
    }
}

fn flat_group(group: &Group<'_>) -> String {
    let body: Vec<String> = group
        .entries
        .iter()
        .map(|(label, value)| format!("{label}{}", flat(value)))
        .collect();
    format!("{}{}{}{}", group.head, group.open, body.join(", "), group.close)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => quote(s),
        Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
        group => flat(group),
    }
}

fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// JSON string literal.
pub(crate) fn quote(s: &str) -> String {
    Json::String(s.to_string()).to_string()
}

/// Canonical number text: integral values without decimals.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        // also covers -0
        "0".to_string()
    } else {
        n.to_string()
    }
}

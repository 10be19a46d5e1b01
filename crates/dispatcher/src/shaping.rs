//! Per-target payload shaping
//!
//! A table from target name to a pure transform of the event body.
//! Targets missing from the table receive the raw body.

use std::collections::HashMap;

use contracts::{PayloadShape, TargetConfig, TargetId, WorkOrderEvent};
use serde_json::{Map, Value};

/// Shaping rule for one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetShaping {
    pub shape: PayloadShape,
    /// Wrap the shaped body as `{ <envelope>: body }`
    pub envelope: Option<String>,
}

impl TargetShaping {
    pub fn raw() -> Self {
        Self::default()
    }

    pub fn flatten(field: impl Into<String>) -> Self {
        Self {
            shape: PayloadShape::Flatten {
                field: field.into(),
            },
            envelope: None,
        }
    }

    pub fn with_envelope(mut self, key: impl Into<String>) -> Self {
        self.envelope = Some(key.into());
        self
    }

    /// Build the payload this target receives
    pub fn apply(&self, event: &WorkOrderEvent) -> Value {
        let body = shape_body(&event.body, &self.shape);
        match &self.envelope {
            Some(key) => {
                let mut wrapped = Map::with_capacity(1);
                wrapped.insert(key.clone(), body);
                Value::Object(wrapped)
            }
            None => body,
        }
    }
}

impl From<&TargetConfig> for TargetShaping {
    fn from(config: &TargetConfig) -> Self {
        Self {
            shape: config.shape.clone(),
            envelope: config.envelope.clone(),
        }
    }
}

/// Apply a shape to an event body
pub fn shape_body(body: &Map<String, Value>, shape: &PayloadShape) -> Value {
    match shape {
        PayloadShape::Raw => Value::Object(body.clone()),
        PayloadShape::Flatten { field } => Value::Object(flatten(body, field)),
    }
}

/// Copy the body and merge `body[field]`'s members into the top level
///
/// Nested keys overwrite top-level keys of the same name. The nested
/// object itself is kept. A missing or non-object field leaves the body
/// unchanged.
fn flatten(body: &Map<String, Value>, field: &str) -> Map<String, Value> {
    let mut out = body.clone();
    if let Some(Value::Object(nested)) = body.get(field) {
        for (key, value) in nested {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}

/// Target name -> shaping rule
#[derive(Debug, Clone, Default)]
pub struct ShapingTable {
    rules: HashMap<TargetId, TargetShaping>,
}

impl ShapingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[TargetConfig]) -> Self {
        Self {
            rules: configs
                .iter()
                .map(|c| (c.name.clone(), TargetShaping::from(c)))
                .collect(),
        }
    }

    pub fn insert(&mut self, target: impl Into<TargetId>, shaping: TargetShaping) {
        self.rules.insert(target.into(), shaping);
    }

    pub fn with(mut self, target: impl Into<TargetId>, shaping: TargetShaping) -> Self {
        self.insert(target, shaping);
        self
    }

    pub fn get(&self, target: &str) -> Option<&TargetShaping> {
        self.rules.get(target)
    }

    /// Payload for `target`, raw when no rule is configured
    pub fn payload_for(&self, target: &str, event: &WorkOrderEvent) -> Value {
        match self.rules.get(target) {
            Some(shaping) => shaping.apply(event),
            None => event.body_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(body: Value) -> WorkOrderEvent {
        match body {
            Value::Object(map) => WorkOrderEvent::new("77", map),
            _ => panic!("test body must be an object"),
        }
    }

    #[test]
    fn test_raw_is_unchanged() {
        let ev = event(json!({"location": {"city": "X"}, "qty": 3}));
        assert_eq!(
            TargetShaping::raw().apply(&ev),
            json!({"location": {"city": "X"}, "qty": 3})
        );
    }

    #[test]
    fn test_flatten_location() {
        let ev = event(json!({"location": {"city": "X"}, "qty": 3}));
        assert_eq!(
            TargetShaping::flatten("location").apply(&ev),
            json!({"location": {"city": "X"}, "qty": 3, "city": "X"})
        );
        // source event untouched
        assert_eq!(ev.body_value(), json!({"location": {"city": "X"}, "qty": 3}));
    }

    #[test]
    fn test_flatten_nested_keys_win() {
        let ev = event(json!({"city": "old", "location": {"city": "new"}}));
        assert_eq!(
            TargetShaping::flatten("location").apply(&ev),
            json!({"city": "new", "location": {"city": "new"}})
        );
    }

    #[test]
    fn test_flatten_missing_or_scalar_field() {
        let ev = event(json!({"qty": 3}));
        assert_eq!(TargetShaping::flatten("location").apply(&ev), json!({"qty": 3}));

        let ev = event(json!({"location": "dock 4"}));
        assert_eq!(
            TargetShaping::flatten("location").apply(&ev),
            json!({"location": "dock 4"})
        );
    }

    #[test]
    fn test_envelope() {
        let ev = event(json!({"wo": 42}));
        assert_eq!(
            TargetShaping::raw().with_envelope("body").apply(&ev),
            json!({"body": {"wo": 42}})
        );
    }

    #[test]
    fn test_table_defaults_to_raw() {
        let table = ShapingTable::new().with("ns", TargetShaping::flatten("location"));
        let ev = event(json!({"location": {"site": 1}}));
        assert_eq!(
            table.payload_for("ns", &ev),
            json!({"location": {"site": 1}, "site": 1})
        );
        assert_eq!(table.payload_for("other", &ev), json!({"location": {"site": 1}}));
    }
}

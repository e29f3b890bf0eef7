use crate::{Error, Result};
use serde_json::{Map, Value};

/// Switches for the repair pipeline, stored as a JSON object addressed by dotted paths.
///
/// Every switch defaults to enabled; a key only has an effect when it is explicitly `false`.
///
/// | key                          | effect when `false`                                 |
/// |------------------------------|-----------------------------------------------------|
/// | `passes.<pass id>`           | skip the whole pass (`labelQuoting`, `er`, `gantt`) |
/// | `er.stripComments`           | keep trailing quoted attribute comments             |
/// | `er.canonicalizeEntities`    | keep `UPPER_SNAKE` entity names                     |
/// | `gantt.fixDelimiters`        | keep stray `:` separators in task bodies            |
/// | `gantt.collapseDependencies` | keep repeated `after` clauses                       |
/// | `gantt.repositionTags`       | keep trailing task tags where they are              |
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig(Value);

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl NormalizeConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::ConfigNotObject {
                found: json_type_name(&value),
            });
        }
        Ok(Self(value))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| Error::InvalidConfigJson {
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| Error::InvalidConfigYaml {
                message: e.to_string(),
            })?;
        let value = serde_json::to_value(raw).map_err(|e| Error::InvalidConfigYaml {
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        cur.as_bool()
    }

    pub fn is_enabled(&self, dotted_path: &str) -> bool {
        self.get_bool(dotted_path).unwrap_or(true)
    }

    /// Shorthand for `set_value("passes.<id>", false)`.
    pub fn disable_pass(&mut self, id: &str) {
        self.set_value(&format!("passes.{id}"), Value::Bool(false));
    }

    /// Sets the value at `dotted_path`, creating (or replacing non-object) parents on the way.
    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        let Value::Object(root) = &mut self.0 else {
            return;
        };
        let (parents, leaf) = match dotted_path.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, dotted_path),
        };
        let mut map = root;
        for segment in parents.into_iter().flat_map(|p| p.split('.')) {
            let slot = map
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(next) = slot else {
                return;
            };
            map = next;
        }
        map.insert(leaf.to_string(), value);
    }

    /// Overlays `other` onto this config: objects merge key by key, anything else replaces.
    pub fn deep_merge(&mut self, other: &Value) {
        overlay(&mut self.0, other);
    }
}

fn overlay(base: &mut Value, top: &Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (key, value) in top_map {
                if let Some(slot) = base_map.get_mut(key) {
                    overlay(slot, value);
                } else {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Reading the two control variables from the authoring-tool player
//!
//! Players expose variables through several accessors depending on their
//! version. Sources are probed in order and the first one that answers wins.

use std::collections::HashMap;

use serde_json::Value;

use crate::platform::SecurityError;
use crate::LockConfig;

/// A way of reading player variables
pub trait VariableSource {
    /// Short label used in logs
    fn label(&self) -> &str;

    /// Read `name`. `Err` means this accessor is not usable here.
    fn get_var(&self, name: &str) -> Result<Value, SecurityError>;
}

/// The target identifier and lock flag read at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Trimmed identifier; empty when missing
    pub id: String,
    pub lock_requested: bool,
}

impl Target {
    pub fn new(id: impl Into<String>, lock_requested: bool) -> Self {
        Self {
            id: id.into().trim().to_string(),
            lock_requested,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Script truthiness of a player value
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form of a player value, empty for falsy values
pub fn text(value: &Value) -> String {
    if !truthy(value) {
        return String::new();
    }
    script_string(value)
}

/// Script `String(value)`: arrays join their elements with `,` and render
/// null elements as empty
fn script_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|v| if v.is_null() { String::new() } else { script_string(v) })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Probe `sources` in order for `name`; `Null` when none answers
pub fn read_var(sources: &[Box<dyn VariableSource>], name: &str) -> Value {
    for source in sources {
        match source.get_var(name) {
            Ok(v) => return v,
            Err(e) => log::trace!("variable source {} unavailable for {}: {}", source.label(), name, e),
        }
    }
    Value::Null
}

/// Read the target identifier and lock flag named in `config`
pub fn read_target(sources: &[Box<dyn VariableSource>], config: &LockConfig) -> Target {
    let id = text(&read_var(sources, &config.id_variable));
    let lock_requested = truthy(&read_var(sources, &config.lock_variable));
    Target::new(id, lock_requested)
}

/// In-memory variable store, e.g. a player's global getter
#[derive(Debug, Clone, Default)]
pub struct MapVariables {
    label: String,
    vars: HashMap<String, Value>,
}

impl MapVariables {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            vars: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.vars.insert(name.to_string(), value);
        self
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }
}

impl VariableSource for MapVariables {
    fn label(&self) -> &str {
        &self.label
    }

    fn get_var(&self, name: &str) -> Result<Value, SecurityError> {
        Ok(self.vars.get(name).cloned().unwrap_or(Value::Null))
    }
}

/// An accessor that is never usable (missing global, foreign player object)
#[derive(Debug, Clone, Default)]
pub struct UnavailableVariables;

impl VariableSource for UnavailableVariables {
    fn label(&self) -> &str {
        "unavailable"
    }

    fn get_var(&self, name: &str) -> Result<Value, SecurityError> {
        Err(SecurityError(format!("player variable {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_matches_script_semantics() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(false)));
        assert!(truthy(&json!("false")));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!([])));
    }

    #[test]
    fn text_converts_and_blanks_falsy() {
        assert_eq!(text(&json!(42)), "42");
        assert_eq!(text(&json!(1.5)), "1.5");
        assert_eq!(text(&json!(null)), "");
        assert_eq!(text(&json!(0)), "");
        assert_eq!(text(&json!("vid1")), "vid1");
    }

    #[test]
    fn text_joins_arrays_like_script_strings() {
        assert_eq!(text(&json!(["vid1"])), "vid1");
        assert_eq!(text(&json!(["a", 1, null, [2, 3]])), "a,1,,2,3");
        assert_eq!(text(&json!([])), "");
        assert_eq!(text(&json!({"id": "vid1"})), "[object Object]");
    }

    #[test]
    fn array_identifier_reads_as_its_element() {
        let sources: Vec<Box<dyn VariableSource>> =
            vec![Box::new(MapVariables::new("player").with("videoObjectId", json!([" vid1 "])).with("videoLocked", json!(1)))];
        assert_eq!(read_target(&sources, &LockConfig::default()), Target::new("vid1", true));
    }

    #[test]
    fn first_answering_source_wins() {
        let cfg = LockConfig::default();
        let sources: Vec<Box<dyn VariableSource>> = vec![
            Box::new(UnavailableVariables),
            Box::new(MapVariables::new("player").with("videoObjectId", json!("  vid1 ")).with("videoLocked", json!(true))),
            Box::new(MapVariables::new("legacy").with("videoObjectId", json!("other"))),
        ];
        let t = read_target(&sources, &cfg);
        assert_eq!(t, Target::new("vid1", true));
    }

    #[test]
    fn no_source_yields_defaults() {
        let cfg = LockConfig::default();
        let sources: Vec<Box<dyn VariableSource>> = vec![Box::new(UnavailableVariables)];
        let t = read_target(&sources, &cfg);
        assert!(!t.is_configured());
        assert!(!t.lock_requested);
    }
}

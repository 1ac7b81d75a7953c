use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single match record exactly as a provider returned it.
///
/// Records from different feeds are merged field by field, so the record is
/// kept as an open JSON object rather than a fixed struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMatch(Map<String, Value>);

impl RawMatch {
    /// Wrap an already decoded JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// The identifier shared across feeds.
    ///
    /// The live feed carries its own `id` next to `fixture_id`, so
    /// `fixture_id` wins when both are present.
    pub fn key(&self) -> Option<String> {
        self.text("fixture_id").or_else(|| self.text("id"))
    }

    /// The competition round this record belongs to, if the feed reports one.
    pub fn round(&self) -> Option<String> {
        self.text("round")
    }

    /// Raw value of a field, whatever its JSON type.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether the field is present, even if null.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Read a scalar field as trimmed text. Numbers are rendered, empty
    /// strings and nulls count as absent.
    pub fn text(&self, field: &str) -> Option<String> {
        scalar_text(self.0.get(field)?)
    }

    /// Read a scalar field nested one object deep, e.g. `home.name`.
    pub fn nested_text(&self, outer: &str, inner: &str) -> Option<String> {
        scalar_text(self.0.get(outer)?.as_object()?.get(inner)?)
    }

    /// Copy every field of `other` onto this record, replacing existing values.
    pub fn overlay(&mut self, other: &RawMatch) {
        for (field, value) in &other.0 {
            self.0.insert(field.clone(), value.clone());
        }
    }
}

impl From<Map<String, Value>> for RawMatch {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

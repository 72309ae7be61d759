use serde_json::Value as JsonValue;

use crate::error::SqlSessionError;
use crate::types::RowValues;

/// An ordered set of named, typed parameters for one statement.
///
/// Insertion order is preserved; setting a name twice replaces the value in
/// place. Names are matched against `:name` placeholders in the SQL text, so
/// a bag may carry entries a given statement never references.
/// ```rust
/// use sql_session::prelude::*;
///
/// let bag = ParamBag::new()
///     .set("id", RowValues::Int(5))
///     .set("name", RowValues::Text("alice".into()));
/// assert_eq!(bag.get("id"), Some(&RowValues::Int(5)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBag {
    entries: Vec<(String, RowValues)>,
}

impl ParamBag {
    /// An empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any existing binding for that name.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: RowValues) -> Self {
        self.insert(name.into(), value);
        self
    }

    /// In-place variant of [`set`](Self::set).
    pub fn insert(&mut self, name: impl Into<String>, value: RowValues) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Look up a binding by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RowValues> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Build a bag from an arbitrary key/value object (the "object overload").
    ///
    /// JSON numbers become `Int` or `Float`, strings `Text`, booleans `Bool`,
    /// null `Null`; nested arrays and objects are carried as `JSON`.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ParameterError` if `object` is not a JSON
    /// object.
    pub fn from_object(object: JsonValue) -> Result<Self, SqlSessionError> {
        let JsonValue::Object(map) = object else {
            return Err(SqlSessionError::ParameterError(format!(
                "expected a JSON object of parameters, got {object}"
            )));
        };
        let mut bag = ParamBag::new();
        for (name, value) in map {
            bag.insert(name, json_to_row_value(value));
        }
        Ok(bag)
    }

    /// Build a bag from any `Serialize` type with named fields, going
    /// through the same JSON mapping as [`from_object`](Self::from_object).
    ///
    /// # Errors
    /// Returns `SqlSessionError::ParameterError` if `value` does not
    /// serialize to a JSON object.
    pub fn from_serializable<T: serde::Serialize>(value: &T) -> Result<Self, SqlSessionError> {
        let json = serde_json::to_value(value).map_err(|e| {
            SqlSessionError::ParameterError(format!("parameter object failed to serialize: {e}"))
        })?;
        Self::from_object(json)
    }

    /// Overlay this bag on top of `base`: entries present here win, entries
    /// only in `base` are appended. Used for ambient-parameter merging.
    #[must_use]
    pub fn merged_over(&self, base: &ParamBag) -> ParamBag {
        let mut merged = self.clone();
        for (name, value) in base.iter() {
            if !merged.contains(name) {
                merged.insert(name, value.clone());
            }
        }
        merged
    }
}

impl<N: Into<String>> FromIterator<(N, RowValues)> for ParamBag {
    fn from_iter<I: IntoIterator<Item = (N, RowValues)>>(iter: I) -> Self {
        let mut bag = ParamBag::new();
        for (name, value) in iter {
            bag.insert(name, value);
        }
        bag
    }
}

fn json_to_row_value(value: JsonValue) -> RowValues {
    match value {
        JsonValue::Null => RowValues::Null,
        JsonValue::Bool(b) => RowValues::Bool(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                RowValues::Int(i)
            } else {
                RowValues::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => RowValues::Text(s),
        other => RowValues::JSON(other),
    }
}

/// Source of ambient parameters merged into every statement.
///
/// An explicit, injected capability: register one on the
/// [`SessionBuilder`](crate::session::SessionBuilder) and its values fill
/// placeholder names the caller did not bind. Caller-supplied bindings always
/// win, and ambient entries a statement never references are ignored.
pub trait AmbientParamSource: Send + Sync {
    fn ambient_params(&self) -> ParamBag;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_replaces_in_place() {
        let bag = ParamBag::new()
            .set("a", RowValues::Int(1))
            .set("b", RowValues::Int(2))
            .set("a", RowValues::Int(3));
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("a"), Some(&RowValues::Int(3)));
        let names: Vec<_> = bag.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn from_object_maps_json_scalars() {
        let bag = ParamBag::from_object(json!({
            "id": 5,
            "ratio": 0.5,
            "name": "x",
            "active": true,
            "note": null,
            "tags": ["a", "b"],
        }))
        .unwrap();
        assert_eq!(bag.get("id"), Some(&RowValues::Int(5)));
        assert_eq!(bag.get("ratio"), Some(&RowValues::Float(0.5)));
        assert_eq!(bag.get("name"), Some(&RowValues::Text("x".into())));
        assert_eq!(bag.get("active"), Some(&RowValues::Bool(true)));
        assert_eq!(bag.get("note"), Some(&RowValues::Null));
        assert!(matches!(bag.get("tags"), Some(RowValues::JSON(_))));
    }

    #[test]
    fn from_serializable_goes_through_field_names() {
        #[derive(serde::Serialize)]
        struct Filter {
            id: i64,
            name: &'static str,
        }

        let bag = ParamBag::from_serializable(&Filter { id: 5, name: "x" }).unwrap();
        assert_eq!(bag.get("id"), Some(&RowValues::Int(5)));
        assert_eq!(bag.get("name"), Some(&RowValues::Text("x".into())));
    }

    #[test]
    fn from_object_rejects_non_objects() {
        let err = ParamBag::from_object(json!([1, 2])).unwrap_err();
        assert!(matches!(err, SqlSessionError::ParameterError(_)));
    }

    #[test]
    fn merged_over_prefers_explicit_values() {
        let ambient = ParamBag::new()
            .set("tenant", RowValues::Int(7))
            .set("id", RowValues::Int(999));
        let explicit = ParamBag::new().set("id", RowValues::Int(5));
        let merged = explicit.merged_over(&ambient);
        assert_eq!(merged.get("id"), Some(&RowValues::Int(5)));
        assert_eq!(merged.get("tenant"), Some(&RowValues::Int(7)));
    }
}

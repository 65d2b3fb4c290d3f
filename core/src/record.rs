//! Dirty-tracking wrapper around a server JSON object.
//!
//! # Design
//! A `Record` owns the field mapping exactly as the server sent it and a
//! `dirty` flag. Writes compare against the current value, so assigning a
//! value the field already holds costs nothing and never schedules a PUT.
//! Only fields the server supplied can be written; the mapping never grows
//! implicitly. A small fixed set of names is reserved for client bookkeeping
//! and is refused before the mapping is consulted.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{ApiError, Result};

/// Names that belong to the client's own bookkeeping, never to the server
/// mapping.
pub const RESERVED_FIELDS: &[&str] = &["session", "user", "is_dirty"];

pub fn is_reserved(field: &str) -> bool {
    RESERVED_FIELDS.contains(&field)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Map<String, Value>,
    dirty: bool,
}

impl Record {
    /// Wrap a mapping fetched from the server. The result is clean.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            dirty: false,
        }
    }

    /// Wrap a mapping built locally that the server has not seen yet. The
    /// result is dirty, so the first `save()` pushes it. A missing or empty
    /// `id` is replaced by a generated one.
    pub fn new_local(mut fields: Map<String, Value>) -> Self {
        let has_id = match fields.get("id") {
            Some(Value::String(id)) => !id.is_empty(),
            Some(Value::Number(_)) => true,
            _ => false,
        };
        if !has_id {
            fields.insert(
                "id".to_string(),
                Value::String(Uuid::new_v4().simple().to_string()),
            );
        }
        Self {
            fields,
            dirty: true,
        }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self::from_map(fields)),
            other => Err(ApiError::DeserializationError(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub fn get(&self, field: &str) -> Result<&Value> {
        if is_reserved(field) {
            return Err(ApiError::ReservedField(field.to_string()));
        }
        self.fields
            .get(field)
            .ok_or_else(|| ApiError::UnknownField(field.to_string()))
    }

    /// Assign `value` to an existing field. Marks the record dirty only when
    /// the value actually changes.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        if is_reserved(field) {
            return Err(ApiError::ReservedField(field.to_string()));
        }
        let current = self
            .fields
            .get_mut(field)
            .ok_or_else(|| ApiError::UnknownField(field.to_string()))?;
        let value = value.into();
        if *current != value {
            *current = value;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn contains(&self, field: &str) -> bool {
        !is_reserved(field) && self.fields.contains_key(field)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called after a successful save.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Caller-facing view of the mapping, without reserved names.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, value)| (key.as_str(), value))
    }

    /// The full mapping, as sent in a save body.
    pub fn to_body(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// The record's `id`, rendered as a string whether the server sent a
    /// string or a number.
    pub fn id(&self) -> Result<String> {
        match self.fields.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(ApiError::MissingArgument("id")),
        }
    }

    /// `true` only when the field exists and is JSON `true`.
    pub fn flag(&self, field: &str) -> bool {
        matches!(self.fields.get(field), Some(Value::Bool(true)))
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn record() -> Record {
        Record::from_value(json!({"id": "1", "name": "X", "isDeleted": false})).unwrap()
    }

    #[test]
    fn fetched_record_starts_clean() {
        assert!(!record().is_dirty());
    }

    #[test]
    fn changing_a_field_marks_dirty() {
        let mut r = record();
        r.set("name", "Y").unwrap();
        assert!(r.is_dirty());
        assert_eq!(r.get("name").unwrap(), "Y");
    }

    #[test]
    fn writing_the_current_value_is_free() {
        let mut r = record();
        r.set("name", "X").unwrap();
        r.set("isDeleted", false).unwrap();
        assert!(!r.is_dirty());
    }

    #[test]
    fn rewriting_current_value_keeps_existing_dirty_state() {
        let mut r = record();
        r.set("name", "Y").unwrap();
        r.set("name", "Y").unwrap();
        assert!(r.is_dirty());
    }

    #[test]
    fn unknown_field_is_rejected_and_record_unchanged() {
        let mut r = record();
        let before = r.clone();
        let err = r.set("color", "red").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
        assert_eq!(r, before);
        assert!(matches!(r.get("color"), Err(ApiError::UnknownField(f)) if f == "color"));
    }

    #[test]
    fn reserved_names_never_reach_the_mapping() {
        let mut r = Record::from_value(json!({"id": "1", "session": "leaked"})).unwrap();
        assert_eq!(r.get("session").unwrap_err().kind(), ErrorKind::ReservedField);
        assert_eq!(r.set("is_dirty", true).unwrap_err().kind(), ErrorKind::ReservedField);
        assert!(!r.is_dirty());
        assert!(!r.contains("session"));
        let keys: Vec<&str> = r.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["id"]);
    }

    #[test]
    fn mark_clean_resets_dirty() {
        let mut r = record();
        r.set("name", "Y").unwrap();
        r.mark_clean();
        assert!(!r.is_dirty());
    }

    #[test]
    fn local_record_starts_dirty() {
        let mut fields = Map::new();
        fields.insert("id".into(), json!("n1"));
        let r = Record::new_local(fields);
        assert!(r.is_dirty());
        assert_eq!(r.id().unwrap(), "n1");
    }

    #[test]
    fn local_record_without_id_gets_one() {
        let mut fields = Map::new();
        fields.insert("id".into(), json!(""));
        let r = Record::new_local(fields);
        assert_eq!(r.id().unwrap().len(), 32);
    }

    #[test]
    fn non_object_is_rejected() {
        let err = Record::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Deserialization);
    }

    #[test]
    fn numeric_id_renders_as_string() {
        let r = Record::from_value(json!({"id": 42})).unwrap();
        assert_eq!(r.id().unwrap(), "42");
        let missing = Record::from_value(json!({"name": "n"})).unwrap();
        assert_eq!(missing.id().unwrap_err().kind(), ErrorKind::MissingArgument);
    }

    #[test]
    fn serializes_as_the_plain_mapping() {
        let r = record();
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value, json!({"id": "1", "name": "X", "isDeleted": false}));
        assert_eq!(r.to_body(), value);
    }

    #[test]
    fn flag_requires_literal_true() {
        let r = Record::from_value(json!({"a": true, "b": "true", "c": null})).unwrap();
        assert!(r.flag("a"));
        assert!(!r.flag("b"));
        assert!(!r.flag("c"));
        assert!(!r.flag("missing"));
    }
}

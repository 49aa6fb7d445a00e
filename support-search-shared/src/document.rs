//! Engine-ready search documents.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::locale::Locale;

/// The serialized representation of one entity.
///
/// `id` is the engine document id (the source row's primary key, or the
/// parent's key for merged translations). `fields` is a sorted map, so two
/// documents built from the same entity serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocument {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl SearchDocument {
    pub fn new(id: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            fields: Map::new(),
        }
    }

    /// Set a scalar or array field.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Set the sub-field of a multi-locale field, e.g. `title.de`.
    ///
    /// Passing `None` writes an explicit `null`, which clears the sub-field
    /// when applied as a partial update.
    pub fn with_locale_field(mut self, name: &str, locale: &Locale, value: Option<String>) -> Self {
        let entry = self
            .fields
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry {
            map.insert(
                locale.as_str().to_string(),
                value.map(Value::String).unwrap_or(Value::Null),
            );
        }
        self
    }

    /// Look up a field by dotted path (`title.en-US`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.fields.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// The `_source` body sent to the engine.
    pub fn to_source(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

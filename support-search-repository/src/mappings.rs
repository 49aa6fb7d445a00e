//! Index mapping builders.
//!
//! Multi-locale fields are stored as objects with one sub-field per supported
//! locale, each analyzed with that locale's analyzers. Sub-field definitions
//! are generated once per document type when its index is created.

use serde_json::{json, Map, Value};
use support_search_shared::Locale;

use crate::analysis::AnalyzerBuilder;

/// Ordered set of field mappings for one document type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    properties: Map<String, Value>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, definition: Value) -> Self {
        self.properties.insert(name.to_string(), definition);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// The `mappings` body of an index.
    pub fn to_json(&self) -> Value {
        json!({
            "dynamic": false,
            "properties": self.properties,
        })
    }
}

/// A text field with one analyzed sub-field per locale.
pub fn locale_text_field(builder: &AnalyzerBuilder, locales: &[Locale]) -> Value {
    let properties: Map<String, Value> = locales
        .iter()
        .map(|locale| {
            let code = locale.as_str();
            (
                code.to_string(),
                json!({
                    "type": "text",
                    "analyzer": builder.index_analyzer_name(code),
                    "search_analyzer": builder.query_analyzer_name(code),
                }),
            )
        })
        .collect();

    json!({ "type": "object", "properties": properties })
}

/// A keyword field with one sub-field per locale.
pub fn locale_keyword_field(locales: &[Locale]) -> Value {
    let properties: Map<String, Value> = locales
        .iter()
        .map(|locale| (locale.as_str().to_string(), keyword()))
        .collect();

    json!({ "type": "object", "properties": properties })
}

pub fn keyword() -> Value {
    json!({ "type": "keyword" })
}

pub fn text() -> Value {
    json!({ "type": "text" })
}

pub fn boolean() -> Value {
    json!({ "type": "boolean" })
}

pub fn date() -> Value {
    json!({ "type": "date" })
}

pub fn integer() -> Value {
    json!({ "type": "integer" })
}

pub fn long() -> Value {
    json!({ "type": "long" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisConfig;

    #[test]
    fn test_locale_text_field_has_every_locale() {
        let builder = AnalyzerBuilder::new(AnalysisConfig::default());
        let locales = vec![Locale::new("en-US").unwrap(), Locale::new("vi").unwrap()];

        let field = locale_text_field(&builder, &locales);
        assert_eq!(field["type"], "object");
        assert_eq!(field["properties"]["en-US"]["analyzer"], "sumo_en-US");
        assert_eq!(field["properties"]["vi"]["analyzer"], "default_sumo");
        assert_eq!(field["properties"]["vi"]["search_analyzer"], "sumo_search_vi");
    }

    #[test]
    fn test_mapping_json() {
        let mapping = Mapping::new()
            .field("locale", keyword())
            .field("updated", date());

        assert!(mapping.contains("locale"));
        assert!(!mapping.contains("title"));
        let body = mapping.to_json();
        assert_eq!(body["properties"]["updated"]["type"], "date");
        assert_eq!(body["dynamic"], false);
    }
}

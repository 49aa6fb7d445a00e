//! Parsed engine search responses.

use serde_json::{Map, Value};

use crate::errors::QueryError;

/// One hit of a search response.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Physical index the hit came from.
    pub index: String,
    pub id: String,
    pub score: f64,
    pub source: Value,
    /// Highlighted fragments by field.
    pub highlight: Map<String, Value>,
}

impl Hit {
    pub fn from_json(hit: &Value) -> Result<Self, QueryError> {
        let field = |name: &str| {
            hit.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| QueryError::malformed(format!("hit without {}", name)))
        };
        Ok(Self {
            index: field("_index")?,
            id: field("_id")?,
            score: hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0),
            source: hit.get("_source").cloned().unwrap_or(Value::Null),
            highlight: hit
                .get("highlight")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }

    /// Source value at a dotted path such as `title.en-US`.
    pub fn value(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.source, |value, part| value.get(part))
            .filter(|value| !value.is_null())
    }

    /// Non-empty text at `path`.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.value(path)
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
    }

    pub fn integer(&self, path: &str) -> Option<i64> {
        self.value(path).and_then(Value::as_i64)
    }

    pub fn flag(&self, path: &str) -> bool {
        self.value(path).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Text at `path`, or a malformed-hit error naming the field.
    pub fn require_text(&self, path: &str) -> Result<&str, QueryError> {
        self.text(path).ok_or_else(|| {
            QueryError::malformed(format!("hit {}/{} has no {}", self.index, self.id, path))
        })
    }

    /// First highlighted fragment of `field`.
    pub fn fragment(&self, field: &str) -> Option<&str> {
        self.highlight
            .get(field)?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .find(|fragment| !fragment.trim().is_empty())
    }
}

/// Total hit count and the returned page of hits.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits {
    pub total: u64,
    pub hits: Vec<Hit>,
}

impl SearchHits {
    /// Parse the body of a search response.
    pub fn from_json(body: &Value) -> Result<Self, QueryError> {
        let hits = body
            .get("hits")
            .ok_or_else(|| QueryError::malformed("response has no hits"))?;
        // Older engines report a bare number instead of `{value, relation}`.
        let total = match hits.get("total") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(total) => total.get("value").and_then(Value::as_u64),
            None => None,
        }
        .ok_or_else(|| QueryError::malformed("response has no total"))?;

        let hits = hits
            .get("hits")
            .and_then(Value::as_array)
            .ok_or_else(|| QueryError::malformed("response has no hit list"))?
            .iter()
            .map(Hit::from_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { total, hits })
    }
}

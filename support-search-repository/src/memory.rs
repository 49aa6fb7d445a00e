//! In-memory search engine.
//!
//! `InMemoryEngine` implements `SearchEngineClient` over a map of indices and
//! interprets the subset of the query DSL emitted by this workspace: `term`,
//! `terms`, `exists`, `bool`, `match_all`, `match_none` and `simple_query_string`, plus
//! highlighting, numeric `sort` and `from`/`size`. Scoring is the sum of the
//! boosts of every field a query term occurs in, which keeps rankings
//! deterministic in tests.
//!
//! Failures can be injected per document or as a run of request timeouts.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use support_search_shared::text::truncate_chars;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::SearchError;
use crate::interfaces::{
    BulkAction, BulkItemResult, BulkOptions, BulkResponse, ConflictPolicy,
    SearchEngineClient, UpdateByQueryResponse,
};

const DEFAULT_SIZE: usize = 10;
const DEFAULT_FRAGMENT_SIZE: usize = 100;

#[derive(Debug, Default)]
struct StoredIndex {
    body: Value,
    docs: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct State {
    indices: BTreeMap<String, StoredIndex>,
    failing: HashSet<(String, String)>,
    pending_timeouts: usize,
    last_search: Option<Value>,
}

impl State {
    fn is_failing(&self, index: &str, id: &str) -> bool {
        self.failing.contains(&(index.to_string(), id.to_string()))
    }

    /// Indices are created on first write, as the engine does.
    fn docs_mut(&mut self, index: &str) -> &mut BTreeMap<String, Value> {
        &mut self.indices.entry(index.to_string()).or_default().docs
    }
}

struct Hit {
    index: String,
    id: String,
    score: f64,
    source: Value,
}

/// In-memory implementation of `SearchEngineClient`.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    state: Mutex<State>,
    bulk_calls: AtomicUsize,
    search_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write of document `id` in `index` fail.
    pub async fn fail_document(&self, index: &str, id: &str) {
        let mut state = self.state.lock().await;
        state.failing.insert((index.to_string(), id.to_string()));
    }

    /// Make the next `count` requests of any kind time out.
    pub async fn fail_next_requests_with_timeout(&self, count: usize) {
        self.state.lock().await.pending_timeouts = count;
    }

    pub async fn document(&self, index: &str, id: &str) -> Option<Value> {
        let state = self.state.lock().await;
        state.indices.get(index)?.docs.get(id).cloned()
    }

    pub async fn document_ids(&self, index: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .indices
            .get(index)
            .map(|stored| stored.docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The body an index was created with.
    pub async fn index_body(&self, index: &str) -> Option<Value> {
        let state = self.state.lock().await;
        state.indices.get(index).map(|stored| stored.body.clone())
    }

    pub async fn last_search(&self) -> Option<Value> {
        self.state.lock().await.last_search.clone()
    }

    /// Bulk requests received, including ones that timed out.
    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    /// Search requests received, including ones that timed out.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Explicit refreshes plus bulk requests sent with `refresh`.
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    async fn check_timeout(&self, operation: &str) -> Result<(), SearchError> {
        let mut state = self.state.lock().await;
        if state.pending_timeouts > 0 {
            state.pending_timeouts -= 1;
            return Err(SearchError::timeout(format!(
                "injected timeout during {}",
                operation
            )));
        }
        Ok(())
    }
}

fn apply_action(state: &mut State, index: &str, action: &BulkAction) -> BulkItemResult {
    let id = action.id().to_string();
    let item = |status: u16, error: Option<Value>| BulkItemResult {
        action: action.kind(),
        id: id.clone(),
        status,
        error,
    };

    if state.is_failing(index, &id) {
        return item(
            400,
            Some(json!({ "type": "mapper_parsing_exception", "reason": "injected failure" })),
        );
    }

    let docs = state.docs_mut(index);
    match action {
        BulkAction::Index { source, .. } => {
            let created = docs.insert(id.clone(), source.clone()).is_none();
            item(if created { 201 } else { 200 }, None)
        }
        BulkAction::Update {
            doc, doc_as_upsert, ..
        } => {
            if let Some(existing) = docs.get_mut(&id) {
                merge(existing, doc);
                return item(200, None);
            }
            if *doc_as_upsert {
                docs.insert(id.clone(), doc.clone());
                item(201, None)
            } else {
                item(
                    404,
                    Some(json!({ "type": "document_missing_exception", "reason": "document missing" })),
                )
            }
        }
        BulkAction::Delete { .. } => match docs.remove(&id) {
            Some(_) => item(200, None),
            None => item(404, None),
        },
    }
}

/// Recursively merge `patch` into `target`, as a partial update does.
fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                let nested = matches!(
                    (target.get(key), value),
                    (Some(Value::Object(_)), Value::Object(_))
                );
                if nested {
                    if let Some(existing) = target.get_mut(key) {
                        merge(existing, value);
                    }
                } else {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

fn lookup<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(source, |value, part| value.get(part))
}

fn texts_at<'a>(source: &'a Value, path: &str) -> Vec<&'a str> {
    match lookup(source, path) {
        Some(Value::String(text)) => vec![text.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            *s == n.to_string()
        }
        _ => a == b,
    }
}

fn field_matches(index: &str, source: &Value, field: &str, expected: &Value) -> bool {
    if field == "_index" {
        return expected.as_str() == Some(index);
    }
    match lookup(source, field) {
        Some(Value::Array(items)) => items.iter().any(|item| scalar_eq(item, expected)),
        Some(value) => scalar_eq(value, expected),
        None => false,
    }
}

/// The single `field: spec` entry of a leaf clause.
fn single_entry(clause: &Value) -> Result<(&String, &Value), SearchError> {
    clause
        .as_object()
        .and_then(|obj| obj.iter().next())
        .ok_or_else(|| SearchError::invalid_query(format!("malformed clause: {}", clause)))
}

fn clause_list(clause: &Value, key: &str) -> Vec<Value> {
    match clause.get(key) {
        Some(Value::Array(items)) => items.clone(),
        Some(single) => vec![single.clone()],
        None => Vec::new(),
    }
}

fn as_count(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Score of `source` against `query`, or `None` when it does not match.
fn evaluate(query: &Value, index: &str, source: &Value) -> Result<Option<f64>, SearchError> {
    let (kind, spec) = single_entry(query)?;
    match kind.as_str() {
        "match_all" => Ok(Some(1.0)),
        "match_none" => Ok(None),
        "term" => {
            let (field, value) = single_entry(spec)?;
            let expected = value.get("value").unwrap_or(value);
            Ok(field_matches(index, source, field, expected).then_some(0.0))
        }
        "terms" => {
            let (field, values) = single_entry(spec)?;
            let values = values.as_array().cloned().unwrap_or_default();
            let matched = values
                .iter()
                .any(|value| field_matches(index, source, field, value));
            Ok(matched.then_some(0.0))
        }
        "exists" => {
            let field = spec
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| SearchError::invalid_query("exists without field"))?;
            let present = match lookup(source, field) {
                None | Some(Value::Null) => false,
                Some(Value::Array(items)) => !items.is_empty(),
                Some(_) => true,
            };
            Ok(present.then_some(0.0))
        }
        "bool" => evaluate_bool(spec, index, source),
        "simple_query_string" => Ok(evaluate_simple_query_string(spec, source)),
        other => Err(SearchError::invalid_query(format!(
            "unsupported query clause: {}",
            other
        ))),
    }
}

fn evaluate_bool(spec: &Value, index: &str, source: &Value) -> Result<Option<f64>, SearchError> {
    let must = clause_list(spec, "must");
    let filter = clause_list(spec, "filter");
    let should = clause_list(spec, "should");

    let mut score = 0.0;
    for clause in &must {
        match evaluate(clause, index, source)? {
            Some(s) => score += s,
            None => return Ok(None),
        }
    }
    for clause in &filter {
        if evaluate(clause, index, source)?.is_none() {
            return Ok(None);
        }
    }
    for clause in clause_list(spec, "must_not") {
        if evaluate(&clause, index, source)?.is_some() {
            return Ok(None);
        }
    }

    // A clause-less bool matches everything, and `minimum_should_match` can
    // never exceed the number of should clauses.
    let default_minimum = usize::from(must.is_empty() && filter.is_empty() && !should.is_empty());
    let minimum = as_count(spec.get("minimum_should_match"))
        .unwrap_or(default_minimum)
        .min(should.len());
    let mut matched = 0;
    for clause in &should {
        if let Some(s) = evaluate(clause, index, source)? {
            matched += 1;
            score += s;
        }
    }
    if matched < minimum {
        return Ok(None);
    }
    Ok(Some(score))
}

/// Split `title.en-US^6` into the field path and its boost.
fn parse_field(field: &str) -> (&str, f64) {
    match field.rsplit_once('^') {
        Some((name, boost)) => (name, boost.parse().unwrap_or(1.0)),
        None => (field, 1.0),
    }
}

fn evaluate_simple_query_string(spec: &Value, source: &Value) -> Option<f64> {
    let terms = tokens(spec.get("query").and_then(Value::as_str).unwrap_or_default());
    if terms.is_empty() {
        return None;
    }
    let require_all = spec
        .get("default_operator")
        .and_then(Value::as_str)
        .is_some_and(|op| op.eq_ignore_ascii_case("and"));

    let fields: Vec<(HashSet<String>, f64)> = spec
        .get("fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(|field| {
                    let (path, boost) = parse_field(field);
                    let field_tokens = texts_at(source, path)
                        .into_iter()
                        .flat_map(tokens)
                        .collect();
                    (field_tokens, boost)
                })
                .collect()
        })
        .unwrap_or_default();

    let mut score = 0.0;
    let mut matched_terms = 0;
    for term in &terms {
        let mut found = false;
        for (field_tokens, boost) in &fields {
            if field_tokens.contains(term) {
                found = true;
                score += boost;
            }
        }
        if found {
            matched_terms += 1;
        }
    }

    let matched = if require_all {
        matched_terms == terms.len()
    } else {
        matched_terms > 0
    };
    matched.then_some(score)
}

/// Tokens of every `simple_query_string` in `query`.
fn query_terms(query: &Value, out: &mut HashSet<String>) {
    match query {
        Value::Object(obj) => {
            for (key, value) in obj {
                if key == "simple_query_string" {
                    if let Some(text) = value.get("query").and_then(Value::as_str) {
                        out.extend(tokens(text));
                    }
                } else {
                    query_terms(value, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| query_terms(item, out)),
        _ => {}
    }
}

/// The first sentence of `text` mentioning a term, with terms wrapped in tags.
fn fragment(
    text: &str,
    terms: &HashSet<String>,
    tags: (&str, &str),
    fragment_size: usize,
) -> Option<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            sentences.push(text[start..end].trim());
            start = end;
        }
    }
    sentences.push(text[start..].trim());

    let sentence = sentences
        .into_iter()
        .find(|sentence| tokens(sentence).iter().any(|token| terms.contains(token)))?;
    let sentence = truncate_chars(sentence, fragment_size);

    let (pre, post) = tags;
    let mut out = String::with_capacity(sentence.len() + 16);
    let mut word = String::new();
    let flush = |word: &mut String, out: &mut String| {
        if word.is_empty() {
            return;
        }
        if terms.contains(&word.to_lowercase()) {
            out.push_str(pre);
            out.push_str(word);
            out.push_str(post);
        } else {
            out.push_str(word);
        }
        word.clear();
    };
    for c in sentence.chars() {
        if c.is_alphanumeric() {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    Some(out)
}

fn highlight(spec: &Value, terms: &HashSet<String>, source: &Value) -> Option<Value> {
    if terms.is_empty() {
        return None;
    }
    let first_tag = |key: &str, default: &'static str| -> String {
        spec.get(key)
            .and_then(|tags| tags.get(0))
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    let pre = first_tag("pre_tags", "<em>");
    let post = first_tag("post_tags", "</em>");
    let fragment_size = as_count(spec.get("fragment_size")).unwrap_or(DEFAULT_FRAGMENT_SIZE);

    let mut out = Map::new();
    for field in spec.get("fields")?.as_object()?.keys() {
        let found = texts_at(source, field)
            .into_iter()
            .find_map(|text| fragment(text, terms, (pre.as_str(), post.as_str()), fragment_size));
        if let Some(found) = found {
            out.insert(field.clone(), json!([found]));
        }
    }
    (!out.is_empty()).then_some(Value::Object(out))
}

/// First sort key of the body as `(field, descending)`.
fn sort_key(body: &Value) -> Option<(String, bool)> {
    let first = body.get("sort")?.as_array()?.first()?;
    match first {
        Value::String(field) => Some((field.clone(), field == "_score")),
        Value::Object(obj) => {
            let (field, spec) = obj.iter().next()?;
            let order = spec
                .get("order")
                .and_then(Value::as_str)
                .or_else(|| spec.as_str())
                .unwrap_or("asc");
            Some((field.clone(), order == "desc"))
        }
        _ => None,
    }
}

fn id_order(a: &Hit, b: &Hit) -> CmpOrdering {
    let numeric = |hit: &Hit| hit.id.parse::<i64>().ok();
    a.index
        .cmp(&b.index)
        .then_with(|| match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.id.cmp(&b.id),
        })
}

fn sort_hits(hits: &mut [Hit], body: &Value) {
    match sort_key(body) {
        Some((field, descending)) if field != "_score" => {
            let key = |hit: &Hit| lookup(&hit.source, &field).and_then(Value::as_f64);
            hits.sort_by(|a, b| {
                let ordering = match (key(a), key(b)) {
                    (Some(x), Some(y)) => {
                        let ordering = x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal);
                        if descending {
                            ordering.reverse()
                        } else {
                            ordering
                        }
                    }
                    (Some(_), None) => CmpOrdering::Less,
                    (None, Some(_)) => CmpOrdering::Greater,
                    (None, None) => CmpOrdering::Equal,
                };
                ordering.then_with(|| id_order(a, b))
            });
        }
        _ => hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(CmpOrdering::Equal)
                .then_with(|| id_order(a, b))
        }),
    }
}

#[async_trait]
impl SearchEngineClient for InMemoryEngine {
    async fn search(&self, indices: &[String], body: &Value) -> Result<Value, SearchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_timeout("search").await?;

        let mut state = self.state.lock().await;
        state.last_search = Some(body.clone());

        let match_all = json!({ "match_all": {} });
        let query = body.get("query").unwrap_or(&match_all);

        // Missing indices are skipped, like `ignore_unavailable`.
        let mut hits = Vec::new();
        for name in indices {
            let Some(stored) = state.indices.get(name) else {
                continue;
            };
            for (id, source) in &stored.docs {
                if let Some(score) = evaluate(query, name, source)? {
                    hits.push(Hit {
                        index: name.clone(),
                        id: id.clone(),
                        score,
                        source: source.clone(),
                    });
                }
            }
        }
        sort_hits(&mut hits, body);

        let total = hits.len();
        let max_score = hits.iter().map(|hit| hit.score).fold(0.0, f64::max);
        let from = as_count(body.get("from")).unwrap_or(0);
        let size = as_count(body.get("size")).unwrap_or(DEFAULT_SIZE);

        let mut terms = HashSet::new();
        query_terms(query, &mut terms);

        let page: Vec<Value> = hits
            .into_iter()
            .skip(from)
            .take(size)
            .map(|hit| {
                let mut rendered = json!({
                    "_index": hit.index,
                    "_id": hit.id,
                    "_score": hit.score,
                    "_source": hit.source,
                });
                let highlighted = body
                    .get("highlight")
                    .and_then(|spec| highlight(spec, &terms, &hit.source));
                if let (Some(highlighted), Some(obj)) = (highlighted, rendered.as_object_mut()) {
                    obj.insert("highlight".to_string(), highlighted);
                }
                rendered
            })
            .collect();

        debug!(total, returned = page.len(), "In-memory search");
        Ok(json!({
            "took": 1,
            "timed_out": false,
            "hits": {
                "total": { "value": total, "relation": "eq" },
                "max_score": max_score,
                "hits": page,
            }
        }))
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
    ) -> Result<(), SearchError> {
        self.check_timeout("index").await?;
        let mut state = self.state.lock().await;
        if state.is_failing(index, id) {
            return Err(SearchError::index(format!("injected failure for {}", id)));
        }
        state.docs_mut(index).insert(id.to_string(), source.clone());
        Ok(())
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
        upsert: bool,
    ) -> Result<(), SearchError> {
        self.check_timeout("update").await?;
        let mut state = self.state.lock().await;
        let action = BulkAction::Update {
            id: id.to_string(),
            doc: doc.clone(),
            doc_as_upsert: upsert,
        };
        let result = apply_action(&mut state, index, &action);
        if result.is_failure() {
            return Err(SearchError::update(format!(
                "update of {} failed with status {}",
                id, result.status
            )));
        }
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, SearchError> {
        self.check_timeout("delete").await?;
        let mut state = self.state.lock().await;
        if state.is_failing(index, id) {
            return Err(SearchError::delete(format!("injected failure for {}", id)));
        }
        Ok(state.docs_mut(index).remove(id).is_some())
    }

    async fn bulk(
        &self,
        index: &str,
        actions: &[BulkAction],
        options: &BulkOptions,
    ) -> Result<BulkResponse, SearchError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        self.check_timeout("bulk").await?;
        if options.refresh {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        }

        let mut state = self.state.lock().await;
        let items = actions
            .iter()
            .map(|action| apply_action(&mut state, index, action))
            .collect();
        Ok(BulkResponse { took_ms: 1, items })
    }

    async fn update_by_query(
        &self,
        index: &str,
        body: &Value,
        _conflicts: ConflictPolicy,
    ) -> Result<UpdateByQueryResponse, SearchError> {
        self.check_timeout("update_by_query").await?;

        let params = body
            .pointer("/script/params")
            .ok_or_else(|| SearchError::update_by_query("script params are required"))?;
        let field = params
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| SearchError::update_by_query("params.field is required"))?;
        let value = params
            .get("value")
            .ok_or_else(|| SearchError::update_by_query("params.value is required"))?;
        let match_all = json!({ "match_all": {} });
        let query = body.get("query").unwrap_or(&match_all);

        let mut state = self.state.lock().await;
        let docs = state.docs_mut(index);

        let mut matched = Vec::new();
        for (id, source) in docs.iter() {
            if evaluate(query, index, source)?.is_some() {
                matched.push(id.clone());
            }
        }

        let mut response = UpdateByQueryResponse {
            total: matched.len() as u64,
            ..UpdateByQueryResponse::default()
        };
        for id in matched {
            let items = docs
                .get_mut(&id)
                .and_then(|source| source.get_mut(field))
                .and_then(Value::as_array_mut);
            if let Some(items) = items {
                if let Some(position) = items.iter().position(|item| scalar_eq(item, value)) {
                    items.remove(position);
                    response.updated += 1;
                }
            }
        }
        Ok(response)
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), SearchError> {
        self.check_timeout("create_index").await?;
        let mut state = self.state.lock().await;
        if state.indices.contains_key(index) {
            return Err(SearchError::index_creation(format!(
                "resource_already_exists_exception: {}",
                index
            )));
        }
        state.indices.insert(
            index.to_string(),
            StoredIndex {
                body: body.clone(),
                docs: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        self.check_timeout("index_exists").await?;
        Ok(self.state.lock().await.indices.contains_key(index))
    }

    async fn delete_index(&self, index: &str) -> Result<bool, SearchError> {
        self.check_timeout("delete_index").await?;
        Ok(self.state.lock().await.indices.remove(index).is_some())
    }

    async fn refresh(&self, _indices: &[String]) -> Result<(), SearchError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        self.check_timeout("health").await?;
        Ok(true)
    }
}

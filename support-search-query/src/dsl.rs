//! Query bodies sent to the engine.

use serde_json::{json, Map, Value};
use support_search_shared::{Locale, Product};

use crate::config::QueryConfig;
use crate::pagination::{offset, PAGE_SIZE};
use crate::summary::{HIGHLIGHT_POST_TAG, HIGHLIGHT_PRE_TAG};

/// Articles returned when a search finds nothing.
pub const POPULAR_SIZE: usize = 20;

/// Longest highlighted fragment, in characters.
pub const FRAGMENT_SIZE: usize = 200;

/// A kind selected for a search, bound to its physical index.
#[derive(Clone, Copy)]
pub struct Target<'a> {
    pub config: &'static dyn QueryConfig,
    pub index: &'a str,
}

/// Build the compound search body over `targets`.
///
/// The filter ORs the targets' type filters and, when a product is given,
/// ORs their product filters. Each product filter is pinned to its target's
/// index, so a kind without one drops out of a product-scoped search.
pub fn search_body(
    query: &str,
    targets: &[Target<'_>],
    locale: &Locale,
    product: Option<&Product>,
    page: usize,
) -> Value {
    let kinds: Vec<Value> = targets
        .iter()
        .map(|target| target.config.type_filter(target.index, locale))
        .collect();
    let mut filter = vec![any_of(kinds)];
    if let Some(product) = product {
        let scoped = targets
            .iter()
            .filter_map(|target| {
                target.config.product_filter(product).map(|product_filter| {
                    json!({
                        "bool": {
                            "filter": [
                                { "term": { "_index": target.index } },
                                product_filter
                            ]
                        }
                    })
                })
            })
            .collect();
        filter.push(any_of(scoped));
    }

    json!({
        "query": {
            "bool": {
                "filter": filter,
                "must": [{
                    "simple_query_string": {
                        "query": query,
                        "fields": search_fields(targets, locale),
                        "default_operator": "AND"
                    }
                }]
            }
        },
        "highlight": build_highlight(targets, locale),
        "from": offset(page),
        "size": PAGE_SIZE
    })
}

/// Matches when any of `clauses` does. An empty list matches nothing, where a
/// clause-less bool would match everything.
fn any_of(clauses: Vec<Value>) -> Value {
    if clauses.is_empty() {
        return json!({ "match_none": {} });
    }
    json!({ "bool": { "should": clauses, "minimum_should_match": 1 } })
}

/// Weighted fields of every target, first occurrence wins.
fn search_fields(targets: &[Target<'_>], locale: &Locale) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for field in targets.iter().flat_map(|target| target.config.fields(locale)) {
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    fields
}

/// Highlight block: sentence fragments, one per field, wrapped in marks.
fn build_highlight(targets: &[Target<'_>], locale: &Locale) -> Value {
    let mut fields = Map::new();
    for field in targets
        .iter()
        .flat_map(|target| target.config.highlight_fields(locale))
    {
        fields.insert(field, json!({}));
    }

    json!({
        "type": "unified",
        "boundary_scanner": "sentence",
        "boundary_scanner_locale": locale.as_str(),
        "number_of_fragments": 1,
        "fragment_size": FRAGMENT_SIZE,
        "pre_tags": [HIGHLIGHT_PRE_TAG],
        "post_tags": [HIGHLIGHT_POST_TAG],
        "fields": fields
    })
}

/// Most visited articles of `locale`, optionally within `product`.
pub fn popular_body(locale: &Locale, product: Option<&Product>) -> Value {
    let mut filter = vec![
        json!({ "exists": { "field": "locale" } }),
        json!({ "exists": { "field": format!("title.{}", locale) } }),
    ];
    if let Some(product) = product {
        filter.push(json!({ "term": { "product_ids": product.id } }));
    }

    json!({
        "query": {
            "bool": {
                "filter": filter,
                "must_not": [{ "term": { "is_archived": true } }]
            }
        },
        "sort": [{ "visits": { "order": "desc" } }],
        "size": POPULAR_SIZE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForumQuery, QuestionQuery, WikiQuery};

    fn en() -> Locale {
        Locale::new("en-US").unwrap()
    }

    #[test]
    fn test_search_body_shape() {
        let targets = [
            Target {
                config: &WikiQuery,
                index: "dev_wiki_document",
            },
            Target {
                config: &QuestionQuery,
                index: "dev_question",
            },
        ];
        let body = search_body("reset password", &targets, &en(), None, 3);

        assert_eq!(body["from"], 20);
        assert_eq!(body["size"], 10);
        let sqs = &body["query"]["bool"]["must"][0]["simple_query_string"];
        assert_eq!(sqs["default_operator"], "AND");
        assert_eq!(sqs["fields"][0], "keywords.en-US^8");
        assert_eq!(sqs["fields"][4], "question_title.en-US^4");

        let kinds = &body["query"]["bool"]["filter"][0]["bool"]["should"];
        assert_eq!(kinds.as_array().unwrap().len(), 2);
        assert_eq!(
            kinds[0]["bool"]["filter"][0],
            json!({ "term": { "_index": "dev_wiki_document" } })
        );
        assert_eq!(body["query"]["bool"]["filter"].as_array().unwrap().len(), 1);

        let highlight = &body["highlight"];
        assert_eq!(highlight["boundary_scanner_locale"], "en-US");
        assert_eq!(highlight["pre_tags"], json!(["<mark>"]));
        assert!(highlight["fields"].get("answer_content.en-US").is_some());
    }

    #[test]
    fn test_product_drops_unscoped_kinds() {
        let targets = [
            Target {
                config: &WikiQuery,
                index: "dev_wiki_document",
            },
            Target {
                config: &ForumQuery,
                index: "dev_forum",
            },
        ];
        let product = Product::new(7, "firefox", "Firefox");
        let body = search_body("sync", &targets, &en(), Some(&product), 1);

        let filter = &body["query"]["bool"]["filter"];
        assert_eq!(filter[0]["bool"]["should"].as_array().unwrap().len(), 2);
        let scoped = filter[1]["bool"]["should"].as_array().unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(
            scoped[0]["bool"]["filter"],
            json!([
                { "term": { "_index": "dev_wiki_document" } },
                { "terms": { "product_ids": [7] } }
            ])
        );
    }

    #[test]
    fn test_product_scope_without_product_filters_matches_nothing() {
        let targets = [Target {
            config: &ForumQuery,
            index: "dev_forum",
        }];
        let product = Product::new(7, "firefox", "Firefox");
        let body = search_body("sync", &targets, &en(), Some(&product), 1);

        assert_eq!(body["query"]["bool"]["filter"][1], json!({ "match_none": {} }));
    }

    #[test]
    fn test_popular_body() {
        let product = Product::new(7, "firefox", "Firefox");
        let body = popular_body(&en(), Some(&product));
        assert_eq!(body["size"], 20);
        assert_eq!(body["sort"], json!([{ "visits": { "order": "desc" } }]));
        assert_eq!(
            body["query"]["bool"]["filter"][2],
            json!({ "term": { "product_ids": 7 } })
        );
    }
}

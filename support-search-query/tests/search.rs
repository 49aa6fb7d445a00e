//! Compound search over documents indexed by the pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use support_search_pipeline::{DocumentRegistry, EntityStores, Indexer, IndexerConfig, MemoryStore};
use support_search_query::{
    ApiError, CompoundSearch, QueryError, SearchForm, SearchKind, SearchRequest, SearchResult,
};
use support_search_repository::{InMemoryEngine, IndexNaming, SearchEngineClient};
use support_search_shared::{
    Answer, ForumPost, Locale, LocaleSettings, Product, Profile, Question, WikiArticle,
};

const FIREFOX: i64 = 1;
const THUNDERBIRD: i64 = 2;

fn en() -> Locale {
    Locale::new("en-US").unwrap()
}

fn article(id: i64, title: &str, content: &str, product: i64, visits: u64) -> WikiArticle {
    WikiArticle {
        id,
        parent_id: None,
        locale: en(),
        title: title.to_string(),
        slug: format!("article-{}", id),
        summary: "Step by step instructions.".to_string(),
        content_html: format!("<p>{}</p>", content),
        keywords: String::new(),
        category: 10,
        is_archived: false,
        has_current_revision: true,
        product_ids: vec![product],
        topic_ids: vec![],
        updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        visits,
        parent_is_hidden: false,
    }
}

fn question(id: i64, title: &str, is_spam: bool) -> Question {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Question {
        id,
        locale: en(),
        title: title.to_string(),
        content_html: "<p>It happens every morning.</p>".to_string(),
        creator_id: 9,
        created: at,
        updated: at,
        updated_by_id: None,
        solution_id: Some(900),
        is_locked: false,
        is_archived: false,
        is_spam,
        product_id: Some(FIREFOX),
        topic_id: None,
        tag_ids: vec![],
        num_votes: 4,
        answers: vec![Answer {
            id: 900,
            content_html: "<p>Clear the cache.</p>".to_string(),
            creator_id: 10,
            is_spam: false,
        }],
    }
}

fn forum_post(id: i64, thread_title: &str) -> ForumPost {
    let at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    ForumPost {
        id,
        thread_id: 30,
        thread_title: thread_title.to_string(),
        forum_id: 3,
        forum_slug: "contributors".to_string(),
        content_html: "<p>Review the password copy.</p>".to_string(),
        author_id: 8,
        created: at,
        updated: at,
        updated_by_id: None,
        thread_is_locked: false,
        thread_is_sticky: false,
    }
}

struct Fixture {
    engine: Arc<InMemoryEngine>,
    search: CompoundSearch,
}

/// 25 Firefox articles about passwords, five unrelated Thunderbird articles
/// with more visits, two questions, one of them spam, and a forum post.
async fn fixture() -> Fixture {
    let mut articles: Vec<WikiArticle> = (1..=25)
        .map(|id| {
            article(
                id,
                &format!("Password tip {}", id),
                "Keep your password safe.",
                FIREFOX,
                id as u64,
            )
        })
        .collect();
    articles.extend((26..=30).map(|id| {
        article(id, &format!("Mail setup {}", id), "Configure accounts.", THUNDERBIRD, 1000)
    }));
    articles.push(article(
        40,
        "Reset your password",
        "Forgot it? Here is how to reset your password. It takes a minute.",
        FIREFOX,
        0,
    ));

    let engine = Arc::new(InMemoryEngine::new());
    let registry = DocumentRegistry::standard(EntityStores {
        wiki: Arc::new(MemoryStore::new(articles)),
        question: Arc::new(MemoryStore::new(vec![
            question(70, "Firefox crashes on startup", false),
            question(71, "Firefox crashes buy now", true),
        ])),
        profile: Arc::new(MemoryStore::<Profile>::new(vec![])),
        forum: Arc::new(MemoryStore::new(vec![forum_post(300, "Password manager draft")])),
    })
    .unwrap();
    let naming = IndexNaming::new("test");
    let indexer = Indexer::new(
        engine.clone(),
        Arc::new(registry),
        naming.clone(),
        IndexerConfig::default(),
    );

    let wiki_ids: Vec<i64> = (1..=30).chain([40]).collect();
    indexer
        .index_objects_bulk("WikiDocument", &wiki_ids, None, None)
        .await
        .unwrap();
    indexer
        .index_objects_bulk("QuestionDocument", &[70, 71], None, None)
        .await
        .unwrap();

    indexer
        .index_objects_bulk("ForumDocument", &[300], None, None)
        .await
        .unwrap();

    Fixture {
        search: CompoundSearch::new(engine.clone(), naming),
        engine,
    }
}

fn wiki_request(query: &str) -> SearchRequest {
    SearchRequest::new(query, en(), vec![SearchKind::Wiki])
}

#[tokio::test]
async fn test_paging_through_25_hits() {
    let f = fixture().await;

    let second = f
        .search
        .search(&wiki_request("password tip").with_page(2))
        .await
        .unwrap();
    assert_eq!(second.total, 25);
    assert_eq!(second.num_results, 10);
    assert!(second.pagination.has_next);
    assert_eq!(
        (second.pagination.start_index, second.pagination.end_index),
        (11, 20)
    );

    let third = f
        .search
        .search(&wiki_request("password tip").with_page(3))
        .await
        .unwrap();
    assert_eq!(third.num_results, 5);
    assert!(!third.pagination.has_next);
    assert!(third.fallback_results.is_none());
}

#[tokio::test]
async fn test_reset_password_end_to_end() {
    let f = fixture().await;

    let response = f
        .search
        .search(&wiki_request("reset password"))
        .await
        .unwrap();

    assert_eq!(response.total, 1);
    let result = &response.results[0];
    assert_eq!(result.type_name(), "document");
    assert_eq!(result.title(), "Reset your password");
    assert_eq!(result.url(), "/en-US/kb/article-40");
    assert!(result.search_summary().contains("<mark>reset</mark>"));
    assert!(result.search_summary().contains("<mark>password</mark>"));

    let sent = f.engine.last_search().await.unwrap();
    assert_eq!(sent["highlight"]["boundary_scanner"], "sentence");
}

#[tokio::test]
async fn test_no_match_offers_popular_articles_of_the_product() {
    let f = fixture().await;
    let firefox = Product::new(FIREFOX, "firefox", "Firefox");

    let response = f
        .search
        .search(
            &wiki_request("xylophone")
                .with_product(firefox)
                .with_popular_fallback(true),
        )
        .await
        .unwrap();

    assert_eq!(response.total, 0);
    assert_eq!(response.product_titles, vec!["Firefox"]);
    let fallback = response.fallback_results.unwrap();
    assert_eq!(fallback.len(), 20);
    // Thunderbird articles have the most visits but are out of scope.
    assert!(fallback
        .iter()
        .all(|result| !(26..=30).any(|id| result.url() == format!("/en-US/kb/article-{}", id))));
    assert_eq!(fallback[0].url(), "/en-US/kb/article-25");
}

#[tokio::test]
async fn test_no_match_without_fallback() {
    let f = fixture().await;

    let response = f.search.search(&wiki_request("xylophone")).await.unwrap();
    assert_eq!(response.total, 0);
    assert!(response.fallback_results.is_none());
    assert_eq!(f.engine.search_calls(), 1);
}

#[tokio::test]
async fn test_questions_skip_spam() {
    let f = fixture().await;

    let request = SearchRequest::new("crashes", en(), vec![SearchKind::Wiki, SearchKind::Question]);
    let response = f.search.search(&request).await.unwrap();

    assert_eq!(response.total, 1);
    assert_eq!(response.w, 3);
    match &response.results[0] {
        SearchResult::Question {
            url,
            is_solved,
            num_answers,
            num_votes,
            last_updated,
            ..
        } => {
            assert_eq!(url, "/en-US/questions/70");
            assert!(*is_solved);
            assert_eq!(*num_answers, 1);
            assert_eq!(*num_votes, 4);
            assert_eq!(
                *last_updated,
                Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
            );
        }
        other => panic!("expected a question, got {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_types_skip_the_engine() {
    let f = fixture().await;
    let params: HashMap<String, String> = [("q", "password"), ("w", "0")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let request = SearchForm::from_params(&params)
        .validate(&LocaleSettings::default(), &[])
        .unwrap();
    let response = f.search.search(&request).await.unwrap();

    assert_eq!(response.num_results, 0);
    assert_eq!(f.engine.search_calls(), 0);
}

#[tokio::test]
async fn test_engine_failure_becomes_unavailable() {
    let f = fixture().await;
    f.engine.fail_next_requests_with_timeout(1).await;

    let err = f
        .search
        .search(&wiki_request("password"))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Search(_)));

    let body = ApiError::from(err);
    assert_eq!(body.status, 503);
    assert!(!body.error.contains("injected"));
}

#[tokio::test]
async fn test_product_scope_excludes_kinds_without_products() {
    let f = fixture().await;
    let forum = SearchRequest::new("password", en(), vec![SearchKind::Forum]);

    let unscoped = f.search.search(&forum).await.unwrap();
    assert_eq!(unscoped.total, 1);
    assert_eq!(unscoped.results[0].type_name(), "thread");

    let firefox = Product::new(FIREFOX, "firefox", "Firefox");
    let scoped = f
        .search
        .search(&forum.clone().with_product(firefox))
        .await
        .unwrap();
    assert_eq!(scoped.total, 0);
    assert!(scoped.results.is_empty());
}

#[tokio::test]
async fn test_documents_without_parent_fields_are_not_served() {
    let f = fixture().await;
    let orphan = json!({
        "title": { "en-US": "Orphaned translation" },
        "slug": { "en-US": "orphaned-translation" },
        "content": { "en-US": "Orphaned text." }
    });
    f.engine
        .index_document("test_wiki_document", "99", &orphan)
        .await
        .unwrap();

    let response = f.search.search(&wiki_request("orphaned")).await.unwrap();
    assert_eq!(response.total, 0);
}

#[tokio::test]
async fn test_malformed_hit_is_left_out() {
    let f = fixture().await;
    for (id, slug) in [("97", Some("zeppelin-care")), ("98", None)] {
        let mut doc = json!({
            "locale": "en-US",
            "title": { "en-US": "Zeppelin care" },
            "content": { "en-US": "Keep the zeppelin dry." }
        });
        if let Some(slug) = slug {
            doc["slug"] = json!({ "en-US": slug });
        }
        f.engine
            .index_document("test_wiki_document", id, &doc)
            .await
            .unwrap();
    }

    let response = f.search.search(&wiki_request("zeppelin")).await.unwrap();
    assert_eq!(response.total, 2);
    assert_eq!(response.num_results, 1);
    assert_eq!(response.results[0].url(), "/en-US/kb/zeppelin-care");
}

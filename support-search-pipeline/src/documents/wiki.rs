use support_search_repository::mappings::{
    boolean, date, integer, keyword, locale_keyword_field, locale_text_field, long,
};
use support_search_repository::{AnalyzerBuilder, Mapping};
use support_search_shared::indices::WIKI_DOCUMENT_INDEX;
use support_search_shared::text::strip_html;
use support_search_shared::{Locale, SearchDocument, WikiArticle};

use super::{timestamp, DocumentSchema, PreparedAction, INDEXED_ON_FIELD};

/// Locale-multi text fields of a knowledge base document.
const LOCALE_TEXT_FIELDS: [&str; 4] = ["title", "keywords", "summary", "content"];

/// Locale-multi keyword fields of a knowledge base document.
const LOCALE_KEYWORD_FIELDS: [&str; 2] = ["slug", "doc_id"];

/// Knowledge base articles.
///
/// Every translation is merged into the document of its parent article: the
/// parent writes the shared fields and its own locale, each translation only
/// writes its locale's sub-fields. Documents are therefore partially upserted.
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiDocument;

impl WikiDocument {
    /// A partial document clearing every locale sub-field of `article`.
    fn blank(&self, article: &WikiArticle) -> SearchDocument {
        LOCALE_TEXT_FIELDS
            .iter()
            .chain(LOCALE_KEYWORD_FIELDS.iter())
            .fold(
                SearchDocument::new(article.document_id()),
                |doc, field| doc.with_locale_field(field, &article.locale, None),
            )
    }
}

impl DocumentSchema for WikiDocument {
    type Entity = WikiArticle;

    const NAME: &'static str = "WikiDocument";
    const INDEX: &'static str = WIKI_DOCUMENT_INDEX;
    const UPDATE_DOCUMENT: bool = true;

    fn mapping(&self, analyzers: &AnalyzerBuilder, locales: &[Locale]) -> Mapping {
        let mapping = LOCALE_TEXT_FIELDS.iter().fold(Mapping::new(), |mapping, field| {
            mapping.field(field, locale_text_field(analyzers, locales))
        });
        LOCALE_KEYWORD_FIELDS
            .iter()
            .fold(mapping, |mapping, field| {
                mapping.field(field, locale_keyword_field(locales))
            })
            .field("locale", keyword())
            .field("category", integer())
            .field("is_archived", boolean())
            .field("product_ids", long())
            .field("topic_ids", long())
            .field("updated", date())
            .field("visits", long())
            .field(INDEXED_ON_FIELD, date())
    }

    fn prepare(&self, article: &WikiArticle) -> SearchDocument {
        let locale = &article.locale;
        let doc = SearchDocument::new(article.document_id())
            .with_locale_field("title", locale, Some(article.title.clone()))
            .with_locale_field("keywords", locale, Some(article.keywords.clone()))
            .with_locale_field("summary", locale, Some(strip_html(&article.summary)))
            .with_locale_field("content", locale, Some(strip_html(&article.content_html)))
            .with_locale_field("slug", locale, Some(article.slug.clone()))
            .with_locale_field("doc_id", locale, Some(article.id.to_string()));

        if article.parent_id.is_some() {
            return doc;
        }
        doc.with_field("locale", locale.as_str())
            .with_field("category", article.category)
            .with_field("is_archived", article.is_archived)
            .with_field("product_ids", article.product_ids.clone())
            .with_field("topic_ids", article.topic_ids.clone())
            .with_field("updated", timestamp(article.updated))
            .with_field("visits", article.visits)
    }

    fn is_eligible(&self, article: &WikiArticle) -> bool {
        article.has_current_revision && !article.is_archived
    }

    fn document_id(&self, article: &WikiArticle) -> String {
        article.document_id().to_string()
    }

    fn prepare_action(&self, article: &WikiArticle) -> PreparedAction {
        // A hidden parent has no document, and its translations must not
        // upsert one back.
        if article.parent_is_hidden {
            return PreparedAction::Remove {
                id: self.document_id(article),
            };
        }
        match (self.is_eligible(article), article.parent_id) {
            (true, _) => PreparedAction::Document(self.prepare(article)),
            // The parent document stays; only this locale disappears.
            (false, Some(_)) => PreparedAction::Document(self.blank(article)),
            (false, None) => PreparedAction::Remove {
                id: self.document_id(article),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn article(id: i64, parent_id: Option<i64>, locale: &str) -> WikiArticle {
        WikiArticle {
            id,
            parent_id,
            locale: Locale::new(locale).unwrap(),
            title: "Reset your password".to_string(),
            slug: "reset-password".to_string(),
            summary: "How to <b>reset</b> it.".to_string(),
            content_html: "<p>Open the menu.</p>".to_string(),
            keywords: "login".to_string(),
            category: 10,
            is_archived: false,
            has_current_revision: true,
            product_ids: vec![1],
            topic_ids: vec![3],
            updated: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            visits: 42,
            parent_is_hidden: false,
        }
    }

    #[test]
    fn test_prepare_parent() {
        let doc = WikiDocument.prepare(&article(5, None, "en-US"));
        assert_eq!(doc.id, "5");
        assert_eq!(doc.get("title.en-US"), Some(&json!("Reset your password")));
        assert_eq!(doc.get("summary.en-US"), Some(&json!("How to reset it.")));
        assert_eq!(doc.get("content.en-US"), Some(&json!("Open the menu.")));
        assert_eq!(doc.get("product_ids"), Some(&json!([1])));
        assert_eq!(doc.get("updated"), Some(&json!("2024-05-01T12:00:00Z")));
        assert_eq!(doc.get("visits"), Some(&json!(42)));
    }

    #[test]
    fn test_prepare_translation_only_writes_its_locale() {
        let doc = WikiDocument.prepare(&article(9, Some(5), "de"));
        assert_eq!(doc.id, "5");
        assert_eq!(doc.get("doc_id.de"), Some(&json!("9")));
        assert!(doc.get("product_ids").is_none());
        assert!(doc.get("title.en-US").is_none());
    }

    #[test]
    fn test_prepare_is_pure() {
        let row = article(5, None, "en-US");
        let first = serde_json::to_vec(&WikiDocument.prepare(&row)).unwrap();
        let second = serde_json::to_vec(&WikiDocument.prepare(&row)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ineligible_rows() {
        let mut parent = article(5, None, "en-US");
        parent.is_archived = true;
        assert_eq!(
            WikiDocument.prepare_action(&parent),
            PreparedAction::Remove { id: "5".to_string() }
        );

        let mut translation = article(9, Some(5), "fr");
        translation.has_current_revision = false;
        match WikiDocument.prepare_action(&translation) {
            PreparedAction::Document(doc) => {
                assert_eq!(doc.id, "5");
                assert_eq!(doc.get("title.fr"), Some(&json!(null)));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_translation_of_hidden_parent_removes_document() {
        let mut translation = article(9, Some(5), "de");
        translation.parent_is_hidden = true;
        assert_eq!(
            WikiDocument.prepare_action(&translation),
            PreparedAction::Remove { id: "5".to_string() }
        );
    }

    #[test]
    fn test_mapping_covers_locales() {
        let locales = vec![Locale::new("en-US").unwrap(), Locale::new("ja").unwrap()];
        let mapping = WikiDocument
            .mapping(&AnalyzerBuilder::default(), &locales)
            .to_json();
        let title = &mapping["properties"]["title"]["properties"];
        assert!(title["en-US"].is_object());
        assert!(title["ja"].is_object());
        assert_eq!(mapping["properties"]["slug"]["properties"]["ja"]["type"], "keyword");
    }
}

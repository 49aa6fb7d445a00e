use support_search_repository::mappings::{boolean, date, integer, keyword, locale_text_field, long};
use support_search_repository::{AnalyzerBuilder, Mapping};
use support_search_shared::indices::QUESTION_INDEX;
use support_search_shared::text::strip_html;
use support_search_shared::{Locale, Question, SearchDocument};

use super::{timestamp, DocumentSchema, INDEXED_ON_FIELD};

/// Support questions with their answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionDocument;

impl DocumentSchema for QuestionDocument {
    type Entity = Question;

    const NAME: &'static str = "QuestionDocument";
    const INDEX: &'static str = QUESTION_INDEX;
    const UPDATE_DOCUMENT: bool = true;

    fn mapping(&self, analyzers: &AnalyzerBuilder, locales: &[Locale]) -> Mapping {
        Mapping::new()
            .field("question_id", long())
            .field("question_title", locale_text_field(analyzers, locales))
            .field("question_content", locale_text_field(analyzers, locales))
            .field("answer_content", locale_text_field(analyzers, locales))
            .field("locale", keyword())
            .field("question_creator_id", long())
            .field("question_created", date())
            .field("question_updated", date())
            .field("question_has_solution", boolean())
            .field("question_is_locked", boolean())
            .field("question_is_archived", boolean())
            .field("question_is_spam", boolean())
            .field("question_product_id", long())
            .field("question_topic_id", long())
            .field("question_tag_ids", long())
            .field("question_num_votes", integer())
            .field("question_num_answers", integer())
            .field(INDEXED_ON_FIELD, date())
    }

    fn prepare(&self, question: &Question) -> SearchDocument {
        let locale = &question.locale;
        let answers: Vec<String> = question
            .answers
            .iter()
            .filter(|answer| !answer.is_spam)
            .map(|answer| strip_html(&answer.content_html))
            .collect();

        SearchDocument::new(question.id)
            .with_field("question_id", question.id)
            .with_locale_field("question_title", locale, Some(question.title.clone()))
            .with_locale_field(
                "question_content",
                locale,
                Some(strip_html(&question.content_html)),
            )
            .with_locale_field("answer_content", locale, Some(answers.join("\n")))
            .with_field("locale", locale.as_str())
            .with_field("question_creator_id", question.creator_id)
            .with_field("question_created", timestamp(question.created))
            .with_field("question_updated", timestamp(question.updated))
            .with_field("question_has_solution", question.solution_id.is_some())
            .with_field("question_is_locked", question.is_locked)
            .with_field("question_is_archived", question.is_archived)
            .with_field("question_is_spam", question.is_spam)
            .with_field("question_product_id", question.product_id)
            .with_field("question_topic_id", question.topic_id)
            .with_field("question_tag_ids", question.tag_ids.clone())
            .with_field("question_num_votes", question.num_votes)
            .with_field("question_num_answers", answers.len() as u64)
    }

    fn is_eligible(&self, question: &Question) -> bool {
        !question.is_spam
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::PreparedAction;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use support_search_shared::Answer;

    fn question() -> Question {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 8, 30, 0).unwrap();
        Question {
            id: 77,
            locale: Locale::new("en-US").unwrap(),
            title: "Bookmarks disappeared".to_string(),
            content_html: "<p>All my bookmarks are gone</p>".to_string(),
            creator_id: 3,
            created: at,
            updated: at,
            updated_by_id: None,
            solution_id: Some(501),
            is_locked: false,
            is_archived: false,
            is_spam: false,
            product_id: Some(1),
            topic_id: None,
            tag_ids: vec![4, 5],
            num_votes: 2,
            answers: vec![
                Answer {
                    id: 501,
                    content_html: "<p>Restore from backup</p>".to_string(),
                    creator_id: 9,
                    is_spam: false,
                },
                Answer {
                    id: 502,
                    content_html: "buy pills".to_string(),
                    creator_id: 10,
                    is_spam: true,
                },
            ],
        }
    }

    #[test]
    fn test_prepare() {
        let doc = QuestionDocument.prepare(&question());
        assert_eq!(doc.id, "77");
        assert_eq!(
            doc.get("question_content.en-US"),
            Some(&json!("All my bookmarks are gone"))
        );
        assert_eq!(
            doc.get("answer_content.en-US"),
            Some(&json!("Restore from backup"))
        );
        assert_eq!(doc.get("question_num_answers"), Some(&json!(1)));
        assert_eq!(doc.get("question_has_solution"), Some(&json!(true)));
        assert_eq!(doc.get("question_topic_id"), Some(&json!(null)));
        assert_eq!(doc.get("question_created"), Some(&json!("2024-02-01T08:30:00Z")));
    }

    #[test]
    fn test_spam_question_is_removed() {
        let mut spam = question();
        spam.is_spam = true;
        assert_eq!(
            QuestionDocument.prepare_action(&spam),
            PreparedAction::Remove { id: "77".to_string() }
        );
    }
}

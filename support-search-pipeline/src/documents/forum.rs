use support_search_repository::mappings::{boolean, date, keyword, long, text};
use support_search_repository::{AnalyzerBuilder, Mapping};
use support_search_shared::indices::FORUM_INDEX;
use support_search_shared::text::strip_html;
use support_search_shared::{ForumPost, Locale, SearchDocument};

use super::{timestamp, DocumentSchema, INDEXED_ON_FIELD};

/// Contributor forum posts, one document per post.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForumDocument;

impl DocumentSchema for ForumDocument {
    type Entity = ForumPost;

    const NAME: &'static str = "ForumDocument";
    const INDEX: &'static str = FORUM_INDEX;
    const UPDATE_DOCUMENT: bool = false;

    fn mapping(&self, _analyzers: &AnalyzerBuilder, _locales: &[Locale]) -> Mapping {
        Mapping::new()
            .field("thread_id", long())
            .field("thread_title", text())
            .field("thread_forum_id", long())
            .field("forum_slug", keyword())
            .field("thread_is_locked", boolean())
            .field("thread_is_sticky", boolean())
            .field("content", text())
            .field("author_id", long())
            .field("created", date())
            .field("updated", date())
            .field(INDEXED_ON_FIELD, date())
    }

    fn prepare(&self, post: &ForumPost) -> SearchDocument {
        SearchDocument::new(post.id)
            .with_field("thread_id", post.thread_id)
            .with_field("thread_title", post.thread_title.as_str())
            .with_field("thread_forum_id", post.forum_id)
            .with_field("forum_slug", post.forum_slug.as_str())
            .with_field("thread_is_locked", post.thread_is_locked)
            .with_field("thread_is_sticky", post.thread_is_sticky)
            .with_field("content", strip_html(&post.content_html))
            .with_field("author_id", post.author_id)
            .with_field("created", timestamp(post.created))
            .with_field("updated", timestamp(post.updated))
    }
}

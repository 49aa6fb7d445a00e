//! Logical index names.
//!
//! The physical name of an index is `{prefix}_{logical}`; see the repository
//! crate's `IndexNaming`.

/// Knowledge base articles.
pub const WIKI_DOCUMENT_INDEX: &str = "wiki_document";

/// Support questions, with their answers embedded.
pub const QUESTION_INDEX: &str = "question";

/// User profiles.
pub const PROFILE_INDEX: &str = "user";

/// Forum posts.
pub const FORUM_INDEX: &str = "forum";

/// Every logical index, in registry order.
pub const ALL_INDICES: [&str; 4] = [
    WIKI_DOCUMENT_INDEX,
    QUESTION_INDEX,
    PROFILE_INDEX,
    FORUM_INDEX,
];

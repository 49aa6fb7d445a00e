//! # Support Search Shared
//!
//! Types shared by every crate of the support site search system: locales,
//! the relational entities handed in by the data layer, engine-ready search
//! documents and the logical index names.

pub mod document;
pub mod indices;
pub mod locale;
pub mod models;
pub mod product;
pub mod text;

pub use document::SearchDocument;
pub use locale::{Locale, LocaleError, LocaleSettings};
pub use models::{Answer, Entity, EntityId, ForumPost, Profile, Question, WikiArticle};
pub use product::Product;

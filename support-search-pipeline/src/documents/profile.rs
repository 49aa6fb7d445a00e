use serde_json::json;
use support_search_repository::mappings::{date, keyword, long, text};
use support_search_repository::{AnalyzerBuilder, Mapping};
use support_search_shared::indices::PROFILE_INDEX;
use support_search_shared::{Locale, Profile, SearchDocument};

use super::{timestamp, DocumentSchema, INDEXED_ON_FIELD};

/// User profiles. Documents are always replaced whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileDocument;

impl DocumentSchema for ProfileDocument {
    type Entity = Profile;

    const NAME: &'static str = "ProfileDocument";
    const INDEX: &'static str = PROFILE_INDEX;
    const UPDATE_DOCUMENT: bool = false;

    fn mapping(&self, _analyzers: &AnalyzerBuilder, _locales: &[Locale]) -> Mapping {
        Mapping::new()
            .field(
                "username",
                json!({ "type": "text", "fields": { "raw": keyword() } }),
            )
            .field("name", text())
            .field("involved_from", date())
            .field("product_ids", long())
            .field("group_ids", long())
            .field(INDEXED_ON_FIELD, date())
    }

    fn prepare(&self, profile: &Profile) -> SearchDocument {
        SearchDocument::new(profile.user_id)
            .with_field("username", profile.username.as_str())
            .with_field("name", profile.name.clone())
            .with_field("involved_from", profile.involved_from.map(timestamp))
            .with_field("product_ids", profile.product_ids.clone())
            .with_field("group_ids", profile.group_ids.clone())
    }

    fn is_eligible(&self, profile: &Profile) -> bool {
        profile.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::PreparedAction;
    use chrono::Utc;

    fn profile(is_active: bool) -> Profile {
        Profile {
            user_id: 12,
            username: "jsmith".to_string(),
            name: Some("Jo Smith".to_string()),
            is_active,
            involved_from: None,
            product_ids: vec![1, 2],
            group_ids: vec![],
            updated: Utc::now(),
        }
    }

    #[test]
    fn test_prepare() {
        let doc = ProfileDocument.prepare(&profile(true));
        assert_eq!(doc.id, "12");
        assert_eq!(doc.get("username"), Some(&json!("jsmith")));
        assert_eq!(doc.get("involved_from"), Some(&json!(null)));
    }

    #[test]
    fn test_inactive_profile_is_removed() {
        assert_eq!(
            ProfileDocument.prepare_action(&profile(false)),
            PreparedAction::Remove { id: "12".to_string() }
        );
    }
}

//! Configuration types for the engine client.

use std::time::Duration;

/// Default OpenSearch URL.
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:9200";

/// Default environment prefix of index names.
pub const DEFAULT_INDEX_PREFIX: &str = "dev";

/// Default client-side request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// The engine URL (e.g. "http://localhost:9200").
    pub url: String,
    /// Timeout applied to every request unless a call overrides it.
    pub timeout: Duration,
    /// Number of primary shards for newly created indices.
    pub number_of_shards: u32,
    /// Number of replicas for newly created indices.
    pub number_of_replicas: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENGINE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

impl EngineConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Maps logical index names onto physical, environment-prefixed names.
///
/// `IndexNaming::new("stage").index("wiki_document")` is `stage_wiki_document`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNaming {
    prefix: String,
}

impl IndexNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Physical name of a logical index.
    pub fn index(&self, logical: &str) -> String {
        if self.prefix.is_empty() {
            logical.to_string()
        } else {
            format!("{}_{}", self.prefix, logical)
        }
    }
}

impl Default for IndexNaming {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_naming() {
        assert_eq!(
            IndexNaming::new("stage").index("wiki_document"),
            "stage_wiki_document"
        );
        assert_eq!(IndexNaming::default().index("question"), "dev_question");
        assert_eq!(IndexNaming::new("").index("user"), "user");
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::new("http://search:9200").with_timeout(Duration::from_secs(30));
        assert_eq!(config.url, "http://search:9200");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.number_of_shards, 1);
    }
}

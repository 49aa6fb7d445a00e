//! Locale analyzer builder.
//!
//! Turns a locale code into named index-time and query-time analyzers and
//! renders the `settings.analysis` block of an index. Names are a pure
//! function of the locale and the configuration, so repeated calls always
//! produce the same analyzers and filters.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use support_search_shared::Locale;

use super::locales::{default_config, locale_override, FilterSpec, LocaleAnalyzerConfig};
use super::synonyms::SynonymCatalog;

/// Name of the shared analyzer used by locales without an override.
pub const DEFAULT_ANALYZER: &str = "default_sumo";

/// Name of the locale-agnostic synonym filter.
pub const ALL_SYNONYM_FILTER: &str = "sumo_synonym_all";

/// A filter as referenced from an analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedFilter {
    pub name: String,
    /// Inline definition, `None` for filters built into the engine.
    pub definition: Option<Value>,
}

/// A named tokenizer plus filter chain.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSpec {
    pub name: String,
    pub tokenizer: String,
    pub filters: Vec<NamedFilter>,
}

impl AnalyzerSpec {
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name.as_str()).collect()
    }

    /// The analyzer entry of `settings.analysis.analyzer`.
    pub fn to_json(&self) -> Value {
        json!({
            "type": "custom",
            "tokenizer": self.tokenizer,
            "filter": self.filter_names(),
        })
    }
}

/// Knobs of the analyzer builder.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    /// Whether plugin-backed analyzers (kuromoji, nori, ...) may be used.
    pub use_plugins: bool,
    pub synonyms: SynonymCatalog,
}

/// Name of the filter at `position` of `locale`'s chain.
///
/// Builtin filters keep their engine name. A custom filter structurally equal
/// to an entry of the default chain reuses that entry's name, so identical
/// definitions are declared once for all locales.
pub fn filter_name(locale: &str, spec: &FilterSpec, position: usize) -> String {
    match spec {
        FilterSpec::Builtin(name) => name.to_string(),
        FilterSpec::Custom(_) => match default_config()
            .filters
            .iter()
            .position(|default| default == spec)
        {
            Some(i) => format!("{}_{}", DEFAULT_ANALYZER, i),
            None => format!("sumo_{}_{}", locale, position),
        },
    }
}

/// Name of the per-locale synonym filter.
pub fn locale_synonym_filter(locale: &str) -> String {
    format!("sumo_synonym_{}", locale)
}

/// Builds analyzers for a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerBuilder {
    config: AnalysisConfig,
}

impl AnalyzerBuilder {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The usable override of `locale`, if any.
    fn resolve(&self, locale: &str) -> Option<LocaleAnalyzerConfig> {
        locale_override(locale).filter(|config| config.plugin.is_none() || self.config.use_plugins)
    }

    /// Name of the analyzer applied to `locale` sub-fields at index time.
    pub fn index_analyzer_name(&self, locale: &str) -> String {
        match self.resolve(locale) {
            Some(_) => format!("sumo_{}", locale),
            None => DEFAULT_ANALYZER.to_string(),
        }
    }

    /// Name of the analyzer applied to queries against `locale` sub-fields.
    pub fn query_analyzer_name(&self, locale: &str) -> String {
        format!("sumo_search_{}", locale)
    }

    /// The default analyzer shared by locales without a usable override.
    pub fn default_analyzer(&self) -> AnalyzerSpec {
        build(DEFAULT_ANALYZER.to_string(), "", &default_config())
    }

    /// Index-time analyzer of `locale`.
    ///
    /// Unknown locales and plugin-backed locales with plugins disabled get the
    /// default analyzer.
    pub fn index_analyzer(&self, locale: &str) -> AnalyzerSpec {
        match self.resolve(locale) {
            Some(config) => build(self.index_analyzer_name(locale), locale, &config),
            None => self.default_analyzer(),
        }
    }

    /// Query-time analyzer of `locale`: the index chain plus synonym graphs.
    pub fn query_analyzer(&self, locale: &str) -> AnalyzerSpec {
        let mut analyzer = self.index_analyzer(locale);
        analyzer.name = self.query_analyzer_name(locale);

        analyzer.filters.push(NamedFilter {
            name: ALL_SYNONYM_FILTER.to_string(),
            definition: Some(synonym_graph(self.config.synonyms.all())),
        });
        if let Some(rules) = self.config.synonyms.for_locale(locale) {
            analyzer.filters.push(NamedFilter {
                name: locale_synonym_filter(locale),
                definition: Some(synonym_graph(rules)),
            });
        }
        analyzer
    }

    /// The `settings.analysis` block covering every locale in `locales`.
    pub fn analysis_settings(&self, locales: &[Locale]) -> Value {
        let mut analyzers = BTreeMap::new();
        let mut filters = Map::new();

        let mut add = |spec: AnalyzerSpec| {
            for filter in &spec.filters {
                if let Some(definition) = &filter.definition {
                    filters
                        .entry(filter.name.clone())
                        .or_insert_with(|| definition.clone());
                }
            }
            analyzers.insert(spec.name.clone(), spec.to_json());
        };

        add(self.default_analyzer());
        for locale in locales {
            add(self.index_analyzer(locale.as_str()));
            add(self.query_analyzer(locale.as_str()));
        }

        json!({
            "analyzer": analyzers,
            "filter": filters,
        })
    }
}

fn build(name: String, locale: &str, config: &LocaleAnalyzerConfig) -> AnalyzerSpec {
    let filters = config
        .filters
        .iter()
        .enumerate()
        .map(|(position, spec)| NamedFilter {
            name: filter_name(locale, spec, position),
            definition: match spec {
                FilterSpec::Builtin(_) => None,
                FilterSpec::Custom(definition) => Some(definition.clone()),
            },
        })
        .collect();

    AnalyzerSpec {
        name,
        tokenizer: config.tokenizer.to_string(),
        filters,
    }
}

fn synonym_graph(rules: &[String]) -> Value {
    json!({
        "type": "synonym_graph",
        "synonyms": rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use support_search_shared::locale::DEFAULT_SUPPORTED_LOCALES;

    fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new(AnalysisConfig {
            use_plugins: false,
            synonyms: SynonymCatalog::new(vec!["addon, extension".to_string()])
                .with_locale("de", vec!["lesezeichen, favorit".to_string()]),
        })
    }

    #[test]
    fn test_naming_is_stable() {
        let builder = builder();
        for locale in DEFAULT_SUPPORTED_LOCALES {
            let first = builder.index_analyzer(locale);
            let second = builder.index_analyzer(locale);
            assert_eq!(first, second);
            assert!(!first.name.is_empty());
            assert_ne!(first.name, builder.query_analyzer(locale).name);
        }
    }

    #[test]
    fn test_unknown_locale_gets_default() {
        let analyzer = builder().index_analyzer("vi");
        assert_eq!(analyzer.name, DEFAULT_ANALYZER);
        assert_eq!(analyzer.filter_names(), vec!["lowercase", "default_sumo_1"]);
    }

    #[test]
    fn test_plugin_locale_falls_back_when_disabled() {
        let disabled = builder();
        assert_eq!(disabled.index_analyzer("ja").name, DEFAULT_ANALYZER);

        let enabled = AnalyzerBuilder::new(AnalysisConfig {
            use_plugins: true,
            ..AnalysisConfig::default()
        });
        let ja = enabled.index_analyzer("ja");
        assert_eq!(ja.name, "sumo_ja");
        assert_eq!(ja.tokenizer, "kuromoji_tokenizer");
    }

    #[test]
    fn test_filter_shared_with_default_chain() {
        let en = builder().index_analyzer("en-US");
        assert_eq!(en.name, "sumo_en-US");
        assert_eq!(
            en.filter_names(),
            vec![
                "lowercase",
                "sumo_en-US_1",
                "sumo_en-US_2",
                "sumo_en-US_3",
                "default_sumo_1",
            ]
        );
    }

    #[test]
    fn test_query_analyzer_appends_synonyms() {
        let builder = builder();

        let de = builder.query_analyzer("de");
        assert_eq!(de.name, "sumo_search_de");
        let names = de.filter_names();
        assert_eq!(names[names.len() - 2], ALL_SYNONYM_FILTER);
        assert_eq!(names[names.len() - 1], "sumo_synonym_de");

        let fr = builder.query_analyzer("fr");
        assert_eq!(fr.filter_names().last(), Some(&ALL_SYNONYM_FILTER));
    }

    #[test]
    fn test_analysis_settings() {
        let locales = vec![
            Locale::new("en-US").unwrap(),
            Locale::new("vi").unwrap(),
            Locale::new("de").unwrap(),
        ];
        let settings = builder().analysis_settings(&locales);

        let analyzers = settings["analyzer"].as_object().unwrap();
        for name in [
            "default_sumo",
            "sumo_en-US",
            "sumo_search_en-US",
            "sumo_search_vi",
            "sumo_de",
            "sumo_search_de",
        ] {
            assert!(analyzers.contains_key(name), "missing analyzer {}", name);
        }
        assert!(!analyzers.contains_key("sumo_vi"));

        let filters = settings["filter"].as_object().unwrap();
        assert_eq!(filters["default_sumo_1"]["type"], "asciifolding");
        assert_eq!(filters["sumo_synonym_de"]["type"], "synonym_graph");
        assert!(!filters.contains_key("lowercase"));
    }
}

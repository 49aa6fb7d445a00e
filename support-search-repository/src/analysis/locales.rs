//! Per-locale analyzer overrides.
//!
//! Each override lists a tokenizer and an ordered filter chain. Filters are
//! either built into the engine (referenced by name) or declared inline as
//! parameterized definitions. Locales that need an engine plugin name it so
//! the builder can fall back to the default analyzer when plugins are off.

use serde_json::{json, Value};

/// One entry of a filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// A filter shipped with the engine, referenced by name.
    Builtin(&'static str),
    /// An inline, parameterized filter definition.
    Custom(Value),
}

/// Tokenizer and filter chain of an analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleAnalyzerConfig {
    pub tokenizer: &'static str,
    /// Engine plugin the chain depends on, if any.
    pub plugin: Option<&'static str>,
    pub filters: Vec<FilterSpec>,
}

/// Accent folding that keeps the original token, shared by the default chain
/// and several locales.
pub fn ascii_folding() -> FilterSpec {
    FilterSpec::Custom(json!({ "type": "asciifolding", "preserve_original": true }))
}

fn stop(stopwords: &str) -> FilterSpec {
    FilterSpec::Custom(json!({ "type": "stop", "stopwords": stopwords }))
}

fn stemmer(language: &str) -> FilterSpec {
    FilterSpec::Custom(json!({ "type": "stemmer", "language": language }))
}

fn elision(articles: &[&str], articles_case: bool) -> FilterSpec {
    FilterSpec::Custom(json!({
        "type": "elision",
        "articles_case": articles_case,
        "articles": articles,
    }))
}

fn standard(filters: Vec<FilterSpec>) -> LocaleAnalyzerConfig {
    LocaleAnalyzerConfig {
        tokenizer: "standard",
        plugin: None,
        filters,
    }
}

fn with_plugin(
    plugin: &'static str,
    tokenizer: &'static str,
    filters: Vec<FilterSpec>,
) -> LocaleAnalyzerConfig {
    LocaleAnalyzerConfig {
        tokenizer,
        plugin: Some(plugin),
        filters,
    }
}

/// The shared analyzer used by every locale without an override.
pub fn default_config() -> LocaleAnalyzerConfig {
    standard(vec![FilterSpec::Builtin("lowercase"), ascii_folding()])
}

/// The override for `locale`, if one is defined.
pub fn locale_override(locale: &str) -> Option<LocaleAnalyzerConfig> {
    use FilterSpec::Builtin;

    let config = match locale {
        "en-US" => standard(vec![
            Builtin("lowercase"),
            stemmer("possessive_english"),
            stop("_english_"),
            stemmer("light_english"),
            ascii_folding(),
        ]),
        "ar" => standard(vec![
            Builtin("lowercase"),
            Builtin("decimal_digit"),
            stop("_arabic_"),
            Builtin("arabic_normalization"),
            stemmer("arabic"),
        ]),
        "bg" => standard(vec![Builtin("lowercase"), stop("_bulgarian_"), stemmer("bulgarian")]),
        "ca" => standard(vec![
            elision(&["d", "l", "m", "n", "s", "t"], true),
            Builtin("lowercase"),
            stop("_catalan_"),
            stemmer("catalan"),
        ]),
        "cs" => standard(vec![Builtin("lowercase"), stop("_czech_"), stemmer("czech")]),
        "da" => standard(vec![Builtin("lowercase"), stop("_danish_"), stemmer("danish")]),
        "de" => standard(vec![
            Builtin("lowercase"),
            stop("_german_"),
            Builtin("german_normalization"),
            stemmer("light_german"),
        ]),
        "el" => standard(vec![
            FilterSpec::Custom(json!({ "type": "lowercase", "language": "greek" })),
            stop("_greek_"),
            stemmer("greek"),
        ]),
        "es" => standard(vec![
            Builtin("lowercase"),
            stop("_spanish_"),
            stemmer("light_spanish"),
            ascii_folding(),
        ]),
        "fa" => standard(vec![
            Builtin("lowercase"),
            Builtin("decimal_digit"),
            Builtin("arabic_normalization"),
            Builtin("persian_normalization"),
            stop("_persian_"),
        ]),
        "fi" => standard(vec![Builtin("lowercase"), stop("_finnish_"), stemmer("finnish")]),
        "fr" => standard(vec![
            elision(
                &[
                    "l", "m", "t", "qu", "n", "s", "j", "d", "c", "jusqu", "quoiqu", "lorsqu",
                    "puisqu",
                ],
                true,
            ),
            Builtin("lowercase"),
            stop("_french_"),
            stemmer("light_french"),
            ascii_folding(),
        ]),
        "hi-IN" => standard(vec![
            Builtin("lowercase"),
            Builtin("decimal_digit"),
            Builtin("indic_normalization"),
            Builtin("hindi_normalization"),
            stop("_hindi_"),
            stemmer("hindi"),
        ]),
        "hu" => standard(vec![
            Builtin("lowercase"),
            stop("_hungarian_"),
            stemmer("light_hungarian"),
        ]),
        "id" => standard(vec![
            Builtin("lowercase"),
            stop("_indonesian_"),
            stemmer("indonesian"),
        ]),
        "it" => standard(vec![
            elision(
                &[
                    "c", "l", "all", "dall", "dell", "nell", "sull", "coll", "pell", "gl", "agl",
                    "dagl", "degl", "negl", "sugl", "un", "m", "t", "s", "v", "d",
                ],
                true,
            ),
            Builtin("lowercase"),
            stop("_italian_"),
            stemmer("light_italian"),
        ]),
        "ja" => with_plugin(
            "analysis-kuromoji",
            "kuromoji_tokenizer",
            vec![
                Builtin("kuromoji_baseform"),
                Builtin("kuromoji_part_of_speech"),
                Builtin("cjk_width"),
                Builtin("ja_stop"),
                Builtin("kuromoji_stemmer"),
                Builtin("lowercase"),
            ],
        ),
        "ko" => with_plugin(
            "analysis-nori",
            "nori_tokenizer",
            vec![Builtin("nori_readingform"), Builtin("lowercase")],
        ),
        "nl" => standard(vec![Builtin("lowercase"), stop("_dutch_"), stemmer("dutch")]),
        "no" => standard(vec![
            Builtin("lowercase"),
            stop("_norwegian_"),
            stemmer("light_norwegian"),
        ]),
        "pl" => with_plugin(
            "analysis-stempel",
            "standard",
            vec![
                Builtin("lowercase"),
                Builtin("polish_stop"),
                Builtin("polish_stem"),
            ],
        ),
        "pt-BR" => standard(vec![
            Builtin("lowercase"),
            stop("_brazilian_"),
            stemmer("brazilian"),
            ascii_folding(),
        ]),
        "pt-PT" => standard(vec![
            Builtin("lowercase"),
            stop("_portuguese_"),
            stemmer("light_portuguese"),
            ascii_folding(),
        ]),
        "ro" => standard(vec![Builtin("lowercase"), stop("_romanian_"), stemmer("romanian")]),
        "ru" => standard(vec![Builtin("lowercase"), stop("_russian_"), stemmer("russian")]),
        "sv" => standard(vec![Builtin("lowercase"), stop("_swedish_"), stemmer("swedish")]),
        "th" => LocaleAnalyzerConfig {
            tokenizer: "thai",
            plugin: None,
            filters: vec![
                Builtin("lowercase"),
                Builtin("decimal_digit"),
                stop("_thai_"),
            ],
        },
        "tr" => standard(vec![
            Builtin("apostrophe"),
            FilterSpec::Custom(json!({ "type": "lowercase", "language": "turkish" })),
            stop("_turkish_"),
            stemmer("turkish"),
        ]),
        "zh-CN" => with_plugin(
            "analysis-smartcn",
            "smartcn_tokenizer",
            vec![Builtin("lowercase"), Builtin("smartcn_stop")],
        ),
        "zh-TW" => standard(vec![
            Builtin("cjk_width"),
            Builtin("lowercase"),
            Builtin("cjk_bigram"),
        ]),
        _ => return None,
    };
    Some(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert_eq!(config.tokenizer, "standard");
        assert!(config.plugin.is_none());
        assert_eq!(config.filters[0], FilterSpec::Builtin("lowercase"));
        assert_eq!(config.filters[1], ascii_folding());
    }

    #[test]
    fn test_plugin_locales_name_their_plugin() {
        for locale in ["ja", "ko", "pl", "zh-CN"] {
            let config = locale_override(locale).unwrap();
            assert!(config.plugin.is_some(), "{} should need a plugin", locale);
        }
        assert!(locale_override("zh-TW").unwrap().plugin.is_none());
    }

    #[test]
    fn test_unknown_locale_has_no_override() {
        assert!(locale_override("vi").is_none());
        assert!(locale_override("xx").is_none());
    }
}

//! Synonym dictionaries applied at query time.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// File holding the locale-agnostic rules inside a synonyms directory.
pub const ALL_SYNONYMS_FILE: &str = "all.txt";

/// Synonym rules, one locale-agnostic list plus optional per-locale lists.
///
/// Rules use the engine's synonym syntax (`a, b, c` or `a => b`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymCatalog {
    all: Vec<String>,
    by_locale: BTreeMap<String, Vec<String>>,
}

impl SynonymCatalog {
    pub fn new(all: Vec<String>) -> Self {
        Self {
            all,
            by_locale: BTreeMap::new(),
        }
    }

    /// The rules shipped with the site when no directory is configured.
    pub fn builtin() -> Self {
        Self::new(
            [
                "addon, add-on, extension",
                "bookmark, favorite, favourite",
                "login, log in, sign in, signin",
                "password, passcode, passphrase",
                "tab, tabs",
            ]
            .iter()
            .map(|rule| rule.to_string())
            .collect(),
        )
    }

    pub fn with_locale(mut self, locale: impl Into<String>, rules: Vec<String>) -> Self {
        self.by_locale.insert(locale.into(), rules);
        self
    }

    /// Load `all.txt` and every `{locale}.txt` from `dir`.
    ///
    /// A missing `all.txt` yields an empty locale-agnostic list.
    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let all_path = dir.join(ALL_SYNONYMS_FILE);
        let all = if all_path.exists() {
            parse_rules(&fs::read_to_string(&all_path)?)
        } else {
            Vec::new()
        };

        let mut catalog = Self::new(all);
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if stem == "all" {
                continue;
            }
            let rules = parse_rules(&fs::read_to_string(&path)?);
            catalog.by_locale.insert(stem.to_string(), rules);
        }
        Ok(catalog)
    }

    pub fn all(&self) -> &[String] {
        &self.all
    }

    /// Rules for `locale`, or `None` when the locale has no dictionary.
    pub fn for_locale(&self, locale: &str) -> Option<&[String]> {
        self.by_locale.get(locale).map(Vec::as_slice)
    }
}

/// One rule per line; blank lines and `#` comments are skipped.
pub fn parse_rules(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

//! Locale identifiers and the system-wide supported-locale list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Locale used when a request or a configuration does not name one.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Locales the support site ships with.
pub const DEFAULT_SUPPORTED_LOCALES: &[&str] = &[
    "en-US", "ar", "bg", "bn", "ca", "cs", "da", "de", "el", "es", "et", "fa", "fi", "fr", "he",
    "hi-IN", "hu", "id", "it", "ja", "ko", "lt", "nl", "no", "pl", "pt-BR", "pt-PT", "ro", "ru",
    "sk", "sl", "sv", "th", "tr", "uk", "vi", "zh-CN", "zh-TW",
];

/// Errors produced when parsing a locale code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("Locale code is empty")]
    Empty,

    #[error("Invalid locale code: {0}")]
    Invalid(String),
}

/// A locale code such as `en-US` or `zh-CN`.
///
/// Locale codes are used verbatim as sub-field names of multi-locale fields
/// (`title.en-US`), so they may only contain ASCII letters, digits and `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Parse and validate a locale code.
    pub fn new(code: impl Into<String>) -> Result<Self, LocaleError> {
        let code = code.into();
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(LocaleError::Empty);
        }
        let valid = trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !trimmed.starts_with('-')
            && !trimmed.ends_with('-');
        if !valid {
            return Err(LocaleError::Invalid(code));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The default locale (`en-US`).
    pub fn default_locale() -> Self {
        Self(DEFAULT_LOCALE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

/// The finite whitelist of locales the system indexes and searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    supported: Vec<Locale>,
    default: Locale,
}

impl LocaleSettings {
    /// Build settings from a list of locales and a default.
    ///
    /// The default is added to the supported list if it is missing, and
    /// duplicates are dropped while keeping the first occurrence.
    pub fn new(supported: Vec<Locale>, default: Locale) -> Self {
        let mut unique: Vec<Locale> = Vec::with_capacity(supported.len() + 1);
        for locale in supported {
            if !unique.contains(&locale) {
                unique.push(locale);
            }
        }
        if !unique.contains(&default) {
            unique.insert(0, default.clone());
        }
        Self {
            supported: unique,
            default,
        }
    }

    /// Parse a comma separated locale list, e.g. `en-US,de,fr`.
    pub fn parse(list: &str, default: &str) -> Result<Self, LocaleError> {
        let supported = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Locale::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(supported, Locale::new(default)?))
    }

    pub fn supported(&self) -> &[Locale] {
        &self.supported
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.supported.iter().any(|l| l.as_str() == code)
    }

    /// Map a requested locale code onto a supported locale, falling back to
    /// the default for unknown or malformed codes.
    pub fn normalize(&self, code: &str) -> Locale {
        self.supported
            .iter()
            .find(|l| l.as_str() == code.trim())
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

impl Default for LocaleSettings {
    fn default() -> Self {
        let supported = DEFAULT_SUPPORTED_LOCALES
            .iter()
            .map(|code| Locale((*code).to_string()))
            .collect();
        Self::new(supported, Locale::default_locale())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_validation() {
        assert_eq!(Locale::new("en-US").unwrap().as_str(), "en-US");
        assert_eq!(Locale::new(" de ").unwrap().as_str(), "de");
        assert_eq!(Locale::new(""), Err(LocaleError::Empty));
        assert!(matches!(Locale::new("en.US"), Err(LocaleError::Invalid(_))));
        assert!(matches!(Locale::new("-fr"), Err(LocaleError::Invalid(_))));
    }

    #[test]
    fn test_default_settings_contain_default_locale() {
        let settings = LocaleSettings::default();
        assert_eq!(settings.default_locale().as_str(), "en-US");
        assert!(settings.is_supported("zh-CN"));
        assert!(!settings.is_supported("xx"));
    }

    #[test]
    fn test_parse_adds_default_and_dedups() {
        let settings = LocaleSettings::parse("de, fr,de", "en-US").unwrap();
        let codes: Vec<&str> = settings.supported().iter().map(Locale::as_str).collect();
        assert_eq!(codes, vec!["en-US", "de", "fr"]);
    }

    #[test]
    fn test_normalize_falls_back_to_default() {
        let settings = LocaleSettings::parse("en-US,de", "en-US").unwrap();
        assert_eq!(settings.normalize("de").as_str(), "de");
        assert_eq!(settings.normalize("xx-YY").as_str(), "en-US");
        assert_eq!(settings.normalize("../etc").as_str(), "en-US");
    }

    #[test]
    fn test_serde_roundtrip_rejects_invalid() {
        let locale: Locale = serde_json::from_str("\"pt-BR\"").unwrap();
        assert_eq!(locale.as_str(), "pt-BR");
        assert!(serde_json::from_str::<Locale>("\"pt BR\"").is_err());
    }
}

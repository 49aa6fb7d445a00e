//! Validation of incoming search parameters.

use std::collections::HashMap;

use serde::Deserialize;
use support_search_shared::{Locale, LocaleSettings, Product};

use crate::errors::QueryError;
use crate::kinds::{SearchKind, DEFAULT_MASK};
use crate::pagination::check_page;

/// A validated search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub locale: Locale,
    pub kinds: Vec<SearchKind>,
    pub product: Option<Product>,
    pub page: usize,
    /// Offer popular articles when nothing matches.
    pub popular_fallback: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, locale: Locale, kinds: Vec<SearchKind>) -> Self {
        Self {
            query: query.into(),
            locale,
            kinds,
            product: None,
            page: 1,
            popular_fallback: false,
        }
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.product = Some(product);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_popular_fallback(mut self, enabled: bool) -> Self {
        self.popular_fallback = enabled;
        self
    }
}

/// Raw search parameters, as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchForm {
    pub q: Option<String>,
    pub w: Option<String>,
    pub page: Option<String>,
    pub locale: Option<String>,
    pub product: Option<String>,
}

impl SearchForm {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).cloned();
        Self {
            q: get("q"),
            w: get("w"),
            page: get("page"),
            locale: get("locale"),
            product: get("product"),
        }
    }

    /// Read and validate `params` in one step.
    pub fn parse(
        params: &HashMap<String, String>,
        locales: &LocaleSettings,
        products: &[Product],
    ) -> Result<SearchRequest, QueryError> {
        Self::from_params(params).validate(locales, products)
    }

    /// Validate the form into a request.
    ///
    /// Unsupported locales fall back to the default one; the product must be
    /// a slug from `products`.
    pub fn validate(
        self,
        locales: &LocaleSettings,
        products: &[Product],
    ) -> Result<SearchRequest, QueryError> {
        let query = present(self.q)
            .ok_or_else(|| QueryError::invalid("q is required"))?
            .trim()
            .to_string();

        let page = match present(self.page) {
            Some(page) => page
                .trim()
                .parse::<usize>()
                .map_err(|_| QueryError::invalid(format!("invalid page: {}", page)))?,
            None => 1,
        };
        let page = check_page(page)?;

        let mask = match present(self.w) {
            Some(w) => w
                .trim()
                .parse::<u32>()
                .map_err(|_| QueryError::invalid(format!("invalid w: {}", w)))?,
            None => DEFAULT_MASK,
        };
        let kinds = SearchKind::from_mask(mask)?;

        let locale = match present(self.locale) {
            Some(code) => locales.normalize(code.trim()),
            None => locales.default_locale().clone(),
        };

        let product = match present(self.product) {
            Some(slug) => Some(
                products
                    .iter()
                    .find(|product| product.slug == slug.trim())
                    .cloned()
                    .ok_or_else(|| QueryError::invalid(format!("unknown product: {}", slug)))?,
            ),
            None => None,
        };

        Ok(SearchRequest {
            query,
            locale,
            kinds,
            product,
            page,
            popular_fallback: true,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn products() -> Vec<Product> {
        vec![Product::new(1, "firefox", "Firefox")]
    }

    fn validate(pairs: &[(&str, &str)]) -> Result<SearchRequest, QueryError> {
        SearchForm::parse(&params(pairs), &LocaleSettings::default(), &products())
    }

    #[test]
    fn test_defaults() {
        let request = validate(&[("q", " crash ")]).unwrap();
        assert_eq!(request.query, "crash");
        assert_eq!(request.page, 1);
        assert_eq!(request.kinds, vec![SearchKind::Wiki, SearchKind::Question]);
        assert_eq!(request.locale, Locale::default_locale());
        assert!(request.popular_fallback);
    }

    #[test]
    fn test_missing_query_is_rejected() {
        assert!(matches!(validate(&[]), Err(QueryError::InvalidRequest(_))));
        assert!(matches!(
            validate(&[("q", "   ")]),
            Err(QueryError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        for pairs in [
            [("q", "x"), ("page", "two")],
            [("q", "x"), ("page", "0")],
            [("q", "x"), ("w", "-1")],
            [("q", "x"), ("w", "64")],
            [("q", "x"), ("product", "thunderbird")],
        ] {
            assert!(
                matches!(validate(&pairs), Err(QueryError::InvalidRequest(_))),
                "{:?} should be rejected",
                pairs
            );
        }
    }

    #[test]
    fn test_product_and_locale() {
        let request = validate(&[
            ("q", "sync"),
            ("product", "firefox"),
            ("locale", "xx-YY"),
            ("w", "0"),
        ])
        .unwrap();
        assert_eq!(request.product.map(|p| p.id), Some(1));
        assert_eq!(request.locale, Locale::default_locale());
        assert!(request.kinds.is_empty());
    }
}

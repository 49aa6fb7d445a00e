//! Searchable kinds and the `w` bitmask selecting them.

use std::fmt;

use crate::errors::QueryError;

/// Kinds selected when the request does not say.
pub const DEFAULT_MASK: u32 = SearchKind::Wiki.bit() | SearchKind::Question.bit();

/// One kind of searchable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchKind {
    Wiki,
    Question,
    Forum,
    Profile,
}

impl SearchKind {
    pub const ALL: [SearchKind; 4] = [Self::Wiki, Self::Question, Self::Forum, Self::Profile];

    pub const fn bit(self) -> u32 {
        match self {
            Self::Wiki => 1,
            Self::Question => 2,
            Self::Forum => 4,
            Self::Profile => 8,
        }
    }

    /// Kinds selected by `mask`, in canonical order.
    pub fn from_mask(mask: u32) -> Result<Vec<SearchKind>, QueryError> {
        let known = Self::ALL.iter().fold(0, |acc, kind| acc | kind.bit());
        if mask & !known != 0 {
            return Err(QueryError::invalid(format!("unknown search types in w={}", mask)));
        }
        Ok(Self::ALL
            .into_iter()
            .filter(|kind| mask & kind.bit() != 0)
            .collect())
    }

    pub fn mask(kinds: &[SearchKind]) -> u32 {
        kinds.iter().fold(0, |acc, kind| acc | kind.bit())
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wiki => "wiki",
            Self::Question => "question",
            Self::Forum => "forum",
            Self::Profile => "profile",
        };
        f.write_str(name)
    }
}

//! Page arithmetic for result lists.

use serde::Serialize;

use crate::errors::QueryError;

/// Results per page.
pub const PAGE_SIZE: usize = 10;

/// Highest page the engine can serve (`from + size` must stay within its
/// result window).
pub const MAX_PAGE: usize = 1000;

/// Pages listed in `page_range`.
pub const PAGE_RANGE_WINDOW: usize = 10;

/// Validate a requested page number.
pub fn check_page(page: usize) -> Result<usize, QueryError> {
    if page == 0 || page > MAX_PAGE {
        return Err(QueryError::invalid(format!(
            "page must be between 1 and {}",
            MAX_PAGE
        )));
    }
    Ok(page)
}

/// Offset of the first hit of `page`.
pub fn offset(page: usize) -> usize {
    page.saturating_sub(1).saturating_mul(PAGE_SIZE)
}

/// Pagination block of the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub number: usize,
    pub num_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub page_range: Vec<usize>,
    /// 1-based position of the first result on the page, 0 when empty.
    pub start_index: usize,
    /// 1-based position of the last result on the page.
    pub end_index: usize,
    pub count: u64,
    pub per_page: usize,
}

impl Pagination {
    pub fn new(number: usize, count: u64) -> Self {
        let count_usize = usize::try_from(count).unwrap_or(usize::MAX);
        let num_pages = count_usize.div_ceil(PAGE_SIZE).max(1);
        let start_index = if count_usize > offset(number) {
            offset(number) + 1
        } else {
            0
        };
        let end_index = if start_index == 0 {
            0
        } else {
            number.saturating_mul(PAGE_SIZE).min(count_usize)
        };

        Self {
            number,
            num_pages,
            has_next: number < num_pages,
            has_previous: number > 1,
            page_range: page_range(number, num_pages),
            start_index,
            end_index,
            count,
            per_page: PAGE_SIZE,
        }
    }
}

/// A window of at most `PAGE_RANGE_WINDOW` pages around `number`.
fn page_range(number: usize, num_pages: usize) -> Vec<usize> {
    let half = PAGE_RANGE_WINDOW / 2;
    let last = number
        .saturating_sub(half)
        .max(1)
        .saturating_add(PAGE_RANGE_WINDOW - 1)
        .min(num_pages);
    let first = (last + 1).saturating_sub(PAGE_RANGE_WINDOW).max(1);
    (first..=last).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_of_25_hits() {
        let second = Pagination::new(2, 25);
        assert_eq!(second.num_pages, 3);
        assert!(second.has_next);
        assert!(second.has_previous);
        assert_eq!((second.start_index, second.end_index), (11, 20));

        let third = Pagination::new(3, 25);
        assert!(!third.has_next);
        assert_eq!((third.start_index, third.end_index), (21, 25));
        assert_eq!(third.page_range, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_results() {
        let empty = Pagination::new(1, 0);
        assert_eq!(empty.num_pages, 1);
        assert!(!empty.has_next);
        assert_eq!((empty.start_index, empty.end_index), (0, 0));
    }

    #[test]
    fn test_page_range_window() {
        assert_eq!(Pagination::new(1, 1000).page_range, (1..=10).collect::<Vec<_>>());
        assert_eq!(Pagination::new(20, 1000).page_range, (15..=24).collect::<Vec<_>>());
        assert_eq!(Pagination::new(99, 1000).page_range, (91..=100).collect::<Vec<_>>());
    }

    #[test]
    fn test_check_page() {
        assert!(check_page(0).is_err());
        assert!(check_page(1001).is_err());
        assert_eq!(check_page(1000).unwrap(), 1000);
        assert_eq!(offset(3), 20);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let pagination = Pagination::new(usize::MAX, 25);
        assert_eq!(pagination.start_index, 0);
        assert!(!pagination.has_next);
        assert_eq!(pagination.page_range, vec![1, 2, 3]);
    }
}

use std::num::IntErrorKind;

use serde::Serialize;

pub const POSTS_PER_PAGE: usize = 10;

/// Resolves a raw `?page=` value against a known item count.
///
/// Missing or malformed values select the first page; integers outside
/// `1..=num_pages`, including ones too large to parse, select the last page.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn resolve(&self, raw: Option<&str>) -> PageWindow {
        let last = self.num_pages();
        let number = match raw.map(str::trim).map(str::parse::<i64>) {
            None => 1,
            Some(Err(e)) => match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => last,
                _ => 1,
            },
            Some(Ok(n)) if n < 1 || n as usize > last => last,
            Some(Ok(n)) => n as usize,
        };
        PageWindow {
            number,
            num_pages: last,
            total: self.total,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

/// Position of one page inside a listing, before its items are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    pub fn with_items<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            has_previous: self.number > 1,
            has_next: self.number < self.num_pages,
            previous_page_number: self.number.saturating_sub(1),
            next_page_number: self.number + 1,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: usize,
    pub next_page_number: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_has_single_page() {
        let window = Paginator::new(0, POSTS_PER_PAGE).resolve(Some("3"));
        assert_eq!(window.number, 1);
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn missing_or_garbage_page_is_first() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        assert_eq!(paginator.resolve(None).number, 1);
        assert_eq!(paginator.resolve(Some("abc")).number, 1);
        assert_eq!(paginator.resolve(Some("")).number, 1);
    }

    #[test]
    fn out_of_range_page_is_clamped_to_last() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 3);
        let window = paginator.resolve(Some("99"));
        assert_eq!(window.number, 3);
        assert_eq!(window.offset, 20);
        assert_eq!(paginator.resolve(Some("0")).number, 3);
        assert_eq!(paginator.resolve(Some("-4")).number, 3);
        assert_eq!(paginator.resolve(Some("99999999999999999999")).number, 3);
        assert_eq!(paginator.resolve(Some("-99999999999999999999")).number, 3);
    }

    #[test]
    fn evenly_divisible_total_has_full_last_page() {
        let paginator = Paginator::new(30, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 3);
        assert_eq!(paginator.resolve(Some("3")).offset, 20);
    }

    #[test]
    fn page_navigation_flags() {
        let page = Paginator::new(25, POSTS_PER_PAGE)
            .resolve(Some("2"))
            .with_items(vec![(); 10]);
        assert!(page.has_previous);
        assert!(page.has_next);
        assert_eq!(page.previous_page_number, 1);
        assert_eq!(page.next_page_number, 3);

        let first = Paginator::new(5, POSTS_PER_PAGE)
            .resolve(None)
            .with_items(vec![(); 5]);
        assert!(!first.has_previous);
        assert!(!first.has_next);
    }
}

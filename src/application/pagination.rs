//! Fixed-size page-number pagination.
//!
//! Listings show [`PAGE_SIZE`] posts per page, addressed by a 1-indexed
//! `page` query parameter. Requests outside the valid range are clamped:
//! anything that does not parse as a positive integer resolves to the first
//! page, anything past the end resolves to the last page. An empty result
//! set still has exactly one (empty) page.

pub const PAGE_SIZE: u32 = 10;

/// A resolved window into an ordered query: `LIMIT limit OFFSET offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total_items: u64,
    per_page: u32,
}

impl Paginator {
    pub fn new(total_items: u64, per_page: u32) -> Self {
        Self {
            total_items,
            per_page: per_page.max(1),
        }
    }

    pub fn total_pages(&self) -> u32 {
        let per_page = u64::from(self.per_page);
        let pages = self.total_items.div_ceil(per_page).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Resolve a raw `page` query value to a valid page number.
    pub fn resolve(&self, requested: Option<&str>) -> u32 {
        let requested = requested
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        requested.min(self.total_pages())
    }

    pub fn slice(&self, page: u32) -> Slice {
        let page = page.clamp(1, self.total_pages());
        Slice {
            limit: self.per_page,
            offset: u64::from(page - 1) * u64::from(self.per_page),
        }
    }
}

/// One page of an ordered listing, with enough shape for the view layer to
/// draw previous/next controls.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_still_has_one_page() {
        let paginator = Paginator::new(0, PAGE_SIZE);

        assert_eq!(paginator.total_pages(), 1);
        assert_eq!(paginator.resolve(Some("7")), 1);
        assert_eq!(paginator.slice(1), Slice {
            limit: PAGE_SIZE,
            offset: 0
        });
    }

    #[test]
    fn thirteen_items_span_two_pages() {
        let paginator = Paginator::new(13, PAGE_SIZE);

        assert_eq!(paginator.total_pages(), 2);
        assert_eq!(paginator.slice(2), Slice {
            limit: PAGE_SIZE,
            offset: 10
        });
    }

    #[test]
    fn exact_multiple_fills_the_final_page() {
        let paginator = Paginator::new(20, PAGE_SIZE);

        assert_eq!(paginator.total_pages(), 2);
        assert_eq!(paginator.slice(2).offset, 10);
    }

    #[test]
    fn out_of_range_requests_clamp_to_last_page() {
        let paginator = Paginator::new(13, PAGE_SIZE);

        assert_eq!(paginator.resolve(Some("99")), 2);
    }

    #[test]
    fn unparsable_requests_resolve_to_first_page() {
        let paginator = Paginator::new(13, PAGE_SIZE);

        assert_eq!(paginator.resolve(None), 1);
        assert_eq!(paginator.resolve(Some("")), 1);
        assert_eq!(paginator.resolve(Some("abc")), 1);
        assert_eq!(paginator.resolve(Some("0")), 1);
        assert_eq!(paginator.resolve(Some("-3")), 1);
    }

    #[test]
    fn page_navigation_flags() {
        let page = Page::<u8> {
            items: Vec::new(),
            number: 2,
            total_pages: 3,
            total_items: 25,
        };

        assert!(page.has_previous());
        assert!(page.has_next());
    }
}

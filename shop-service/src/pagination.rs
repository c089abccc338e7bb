use shared::{PageQuery, PaginationMeta};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Offset pagination shared by every list endpoint: page defaults to 1,
/// limit defaults to 10 and is capped at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: i64, limit: i64) -> Self {
        let page = if page < 1 { 1 } else { page };
        let limit = if limit < 1 { DEFAULT_LIMIT } else { limit.min(MAX_LIMIT) };
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn meta(&self, total: i64) -> PaginationMeta {
        PaginationMeta::new(self.page, self.limit, total)
    }
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        Page::new(query.page.unwrap_or(1), query.limit.unwrap_or(DEFAULT_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn out_of_range_values_fall_back_to_defaults() {
        assert_eq!(Page::new(0, 0), Page { page: 1, limit: 10 });
        assert_eq!(Page::new(-3, -1), Page { page: 1, limit: 10 });
        assert_eq!(Page::new(2, 500), Page { page: 2, limit: 100 });
    }

    #[test]
    fn second_page_of_twenty_five() {
        let page = Page::new(2, 10);
        assert_eq!(page.offset(), 10);
        let meta = page.meta(25);
        assert_eq!(meta.total_page, 3);
        assert_eq!((meta.page, meta.limit, meta.total), (2, 10, 25));
    }

    #[test]
    fn missing_query_params_use_defaults() {
        assert_eq!(Page::from(PageQuery::default()), Page { page: 1, limit: 10 });
    }

    proptest! {
        #[test]
        fn normalized_page_is_always_in_bounds(page in any::<i64>(), limit in any::<i64>()) {
            let p = Page::new(page, limit);
            prop_assert!(p.page >= 1);
            prop_assert!((1..=MAX_LIMIT).contains(&p.limit));
            prop_assert!(p.offset() >= 0);
        }
    }
}

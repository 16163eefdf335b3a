use cinelog_models::PageInfo;
use serde::Serialize;

/// Position within a paged collection
///
/// Only [`PaginationCursor::apply`] can change a cursor, and it always
/// replaces every field from the server's page info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationCursor {
    current_page: u32,
    total_pages: u32,
    total_items: u32,
    has_next: bool,
    has_prev: bool,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::from_page_info(&PageInfo::default())
    }
}

impl PaginationCursor {
    pub fn from_page_info(info: &PageInfo) -> Self {
        Self {
            current_page: info.current_page,
            total_pages: info.total_pages,
            total_items: info.total_items,
            has_next: info.current_page < info.total_pages,
            has_prev: info.current_page > 1,
        }
    }

    pub fn apply(&mut self, info: &PageInfo) {
        *self = Self::from_page_info(info);
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_prev(&self) -> bool {
        self.has_prev
    }
}

/// One cursor per paged collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursors {
    pub movies: PaginationCursor,
    pub movie_reviews: PaginationCursor,
    pub user_reviews: PaginationCursor,
    pub watchlist: PaginationCursor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_of_three() {
        let mut cursor = PaginationCursor::default();
        cursor.apply(&PageInfo::new(1, 3, 25));

        assert!(!cursor.has_prev());
        assert!(cursor.has_next());
        assert_eq!(cursor.total_items(), 25);
    }

    #[test]
    fn test_last_page() {
        let cursor = PaginationCursor::from_page_info(&PageInfo::new(3, 3, 25));
        assert!(cursor.has_prev());
        assert!(!cursor.has_next());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let info = PageInfo::new(2, 4, 40);
        let mut once = PaginationCursor::default();
        once.apply(&info);
        let mut twice = once;
        twice.apply(&info);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_replaces_wholesale() {
        let mut cursor = PaginationCursor::from_page_info(&PageInfo::new(4, 4, 40));
        cursor.apply(&PageInfo::new(1, 1, 3));

        assert_eq!(cursor, PaginationCursor::from_page_info(&PageInfo::new(1, 1, 3)));
        assert!(!cursor.has_next());
        assert!(!cursor.has_prev());
    }

    #[test]
    fn test_empty_collection() {
        let cursor = PaginationCursor::from_page_info(&PageInfo::new(1, 0, 0));
        assert!(!cursor.has_next());
        assert!(!cursor.has_prev());
    }

    #[test]
    fn test_serializes_derived_flags() {
        let cursor = PaginationCursor::from_page_info(&PageInfo::new(2, 3, 30));
        let json = serde_json::to_value(cursor).unwrap();
        assert_eq!(json["hasNext"], true);
        assert_eq!(json["hasPrev"], true);
        assert_eq!(json["currentPage"], 2);
    }
}

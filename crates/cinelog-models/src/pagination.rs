use serde::{Deserialize, Serialize};

/// Pagination block returned with every paged response
///
/// The backend names the total after the collection (`totalMovies`,
/// `totalReviews`, `totalItems`); all three land in `total_items`.
/// Its own `hasNext`/`hasPrev` flags are ignored, the cursor derives them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default = "default_page")]
    pub current_page: u32,
    #[serde(default = "default_page")]
    pub total_pages: u32,
    #[serde(default, alias = "totalMovies", alias = "totalReviews")]
    pub total_items: u32,
}

fn default_page() -> u32 {
    1
}

impl PageInfo {
    pub fn new(current_page: u32, total_pages: u32, total_items: u32) -> Self {
        Self { current_page, total_pages, total_items }
    }

    /// Whether this page holds the entire collection
    pub fn is_complete(&self) -> bool {
        self.total_pages <= 1
    }
}

impl Default for PageInfo {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

/// A page of items plus its pagination block
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self { items, page_info }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_info_accepts_collection_specific_totals() {
        let movies: PageInfo =
            serde_json::from_str(r#"{"currentPage":2,"totalPages":5,"totalMovies":48,"hasNext":true}"#).unwrap();
        assert_eq!(movies, PageInfo::new(2, 5, 48));

        let reviews: PageInfo =
            serde_json::from_str(r#"{"currentPage":1,"totalPages":1,"totalReviews":3}"#).unwrap();
        assert_eq!(reviews.total_items, 3);
        assert!(reviews.is_complete());
    }

    #[test]
    fn test_page_info_defaults_missing_fields() {
        let info: PageInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, PageInfo::default());
    }
}

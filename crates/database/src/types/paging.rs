//! Offset paging primitives shared by every list query.

/// A window into an ordered result set.
///
/// ```
/// use staybook_database::PageRequest;
///
/// let request = PageRequest::from_page(3, 20);
/// assert_eq!(request.offset, 40);
/// assert_eq!(request.limit, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Page numbers start at 1; a page number of 0 is treated as 1.
    pub fn from_page(page: u32, page_size: u32) -> Self {
        let page = i64::from(page.max(1));
        let limit = i64::from(page_size.max(1));
        Self {
            offset: (page - 1) * limit,
            limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::from_page(1, 20)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of matching rows across all pages.
    pub total: i64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

use serde::{Deserialize, Serialize};

/// Pagination parameters for listing queries.
///
/// Pages are 1-based. Results are always ordered newest first by creation
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPageRequest")]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

/// Wire form of [`PageRequest`]; every value goes through the clamping in
/// [`PageRequest::new`].
#[derive(Deserialize)]
struct RawPageRequest {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    limit: u32,
}

impl From<RawPageRequest> for PageRequest {
    fn from(raw: RawPageRequest) -> Self {
        Self::new(raw.page, raw.limit)
    }
}

impl PageRequest {
    /// Default page size.
    pub const DEFAULT_LIMIT: u32 = 20;

    /// Largest page size a caller may request.
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a page request, clamping out-of-range values.
    ///
    /// A page below 1 becomes 1; a limit of 0 falls back to the default and a
    /// limit above the maximum is capped.
    pub fn new(page: u32, limit: u32) -> Self {
        let limit = match limit {
            0 => Self::DEFAULT_LIMIT,
            l => l.min(Self::MAX_LIMIT),
        };
        Self {
            page: page.max(1),
            limit,
        }
    }

    /// Returns the first page with the default size.
    pub fn first() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of results together with the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// Creates a page for the given request.
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            limit: request.limit(),
        }
    }

    /// Total number of pages for the matching rows.
    pub fn total_pages(&self) -> i64 {
        if self.total <= 0 || self.limit == 0 {
            0
        } else {
            (self.total + i64::from(self.limit) - 1) / i64::from(self.limit)
        }
    }

    /// Converts every item, keeping the pagination metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: self.total,
            page: self.page,
            limit: self.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_values() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), PageRequest::DEFAULT_LIMIT);

        let req = PageRequest::new(3, 500);
        assert_eq!(req.page(), 3);
        assert_eq!(req.limit(), PageRequest::MAX_LIMIT);
    }

    #[test]
    fn page_request_offset() {
        assert_eq!(PageRequest::new(1, 20).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn page_request_deserialization_is_clamped() {
        let req: PageRequest = serde_json::from_str(r#"{"page":0,"limit":0}"#).unwrap();
        assert_eq!(req, PageRequest::first());
        assert_eq!(req.offset(), 0);

        let req: PageRequest = serde_json::from_str(r#"{"page":2,"limit":1000}"#).unwrap();
        assert_eq!(req.limit(), PageRequest::MAX_LIMIT);
        assert_eq!(req.offset(), 100);

        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, PageRequest::default());
    }

    #[test]
    fn page_total_pages() {
        let page: Page<u8> = Page::new(vec![], 41, PageRequest::new(1, 20));
        assert_eq!(page.total_pages(), 3);

        let empty: Page<u8> = Page::new(vec![], 0, PageRequest::first());
        assert_eq!(empty.total_pages(), 0);
    }

    #[test]
    fn page_try_map_keeps_metadata() {
        let page = Page::new(vec![1, 2, 3], 13, PageRequest::new(2, 3));
        let mapped: Page<String> = page
            .try_map(|n| Ok::<_, std::convert::Infallible>(n.to_string()))
            .unwrap();

        assert_eq!(mapped.items, vec!["1", "2", "3"]);
        assert_eq!(mapped.total, 13);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.limit, 3);
    }
}

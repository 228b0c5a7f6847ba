//! Offset pagination metadata
//!
//! Derived on every list request from the resolved window and the filtered
//! total; never stored.

use serde::Serialize;
use url::Url;
use utoipa::ToSchema;

/// Pagination metadata returned alongside a page of persons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
    /// Number of records matching the filter (not the page length)
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

impl Pagination {
    /// Derive next/previous links for a window over `total` records
    ///
    /// `base_url` keeps scheme, host and path; any query string and fragment
    /// are replaced by the window parameters.
    ///
    /// # Examples
    /// ```
    /// use people_info::pagination::Pagination;
    /// use url::Url;
    ///
    /// let base = Url::parse("http://localhost:8080/api/v1/persons").unwrap();
    /// let p = Pagination::derive(5, 5, 12, &base);
    /// assert_eq!(p.previous.as_deref(), Some("http://localhost:8080/api/v1/persons?limit=5&offset=0"));
    /// assert_eq!(p.next.as_deref(), Some("http://localhost:8080/api/v1/persons?limit=5&offset=10"));
    /// ```
    pub fn derive(limit: u64, offset: u64, total: u64, base_url: &Url) -> Self {
        let previous = (offset > 0).then(|| page_link(base_url, limit, offset.saturating_sub(limit)));

        let next_offset = offset.saturating_add(limit);
        let next = (next_offset < total).then(|| page_link(base_url, limit, next_offset));

        Self {
            limit,
            offset,
            total,
            next,
            previous,
        }
    }
}

fn page_link(base_url: &Url, limit: u64, offset: u64) -> String {
    let mut link = base_url.clone();
    link.set_fragment(None);
    link.set_query(None);
    link.query_pairs_mut()
        .append_pair("limit", &limit.to_string())
        .append_pair("offset", &offset.to_string());
    link.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:8080/api/v1/persons").unwrap()
    }

    fn link(offset: u64) -> Option<String> {
        Some(format!(
            "http://localhost:8080/api/v1/persons?limit=5&offset={}",
            offset
        ))
    }

    #[test]
    fn test_pagination_middle_page() {
        let p = Pagination::derive(5, 5, 12, &base());
        assert_eq!(p.previous, link(0));
        assert_eq!(p.next, link(10));
        assert_eq!(p.total, 12);
    }

    #[test]
    fn test_pagination_last_page() {
        let p = Pagination::derive(5, 10, 12, &base());
        assert_eq!(p.previous, link(5));
        assert_eq!(p.next, None);
    }

    #[test]
    fn test_pagination_first_page() {
        let p = Pagination::derive(5, 0, 12, &base());
        assert_eq!(p.previous, None);
        assert_eq!(p.next, link(5));
    }

    #[test]
    fn test_pagination_previous_clamps_to_zero() {
        let p = Pagination::derive(5, 3, 12, &base());
        assert_eq!(p.previous, link(0));
        assert_eq!(p.next, link(8));
    }

    #[test]
    fn test_pagination_offset_beyond_total() {
        let p = Pagination::derive(5, 10, 3, &base());
        assert_eq!(p.total, 3);
        assert_eq!(p.next, None);
        assert_eq!(p.previous, link(5));
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = Pagination::derive(5, 5, 10, &base());
        assert_eq!(p.next, None);
    }

    #[test]
    fn test_pagination_empty() {
        let p = Pagination::derive(5, 0, 0, &base());
        assert_eq!(p.next, None);
        assert_eq!(p.previous, None);
    }

    #[test]
    fn test_pagination_strips_existing_query() {
        let base = Url::parse("https://people.example.com/api/v1/persons?gender=male&limit=99#top")
            .unwrap();
        let p = Pagination::derive(5, 0, 6, &base);
        assert_eq!(
            p.next.as_deref(),
            Some("https://people.example.com/api/v1/persons?limit=5&offset=5")
        );
    }

    #[test]
    fn test_pagination_omits_absent_links() {
        let p = Pagination::derive(5, 0, 3, &base());
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value, serde_json::json!({"limit": 5, "offset": 0, "total": 3}));
    }

    #[test]
    fn test_pagination_huge_window_does_not_overflow() {
        let p = Pagination::derive(u64::MAX, u64::MAX, 1, &base());
        assert_eq!(p.next, None);
        assert!(p.previous.is_some());
    }
}

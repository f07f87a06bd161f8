//! This modules defines the common functionality for paging data.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of expenses to display per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 25,
        }
    }
}

impl PaginationConfig {
    /// Build a page request, using the configured defaults for missing values.
    ///
    /// # Errors
    /// Returns [Error::InvalidPageSize] or [Error::InvalidPage] if the
    /// resulting page size or page number is zero.
    pub fn page_request(
        &self,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<PageRequest, Error> {
        PageRequest::new(
            page.unwrap_or(self.default_page),
            page_size.unwrap_or(self.default_page_size),
        )
    }
}

/// A validated request for one page of results.
///
/// Pages are numbered from 1 and hold at least one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Create a page request.
    ///
    /// # Errors
    /// Returns [Error::InvalidPageSize] if `page_size` is zero and
    /// [Error::InvalidPage] if `page` is zero.
    pub fn new(page: u64, page_size: u64) -> Result<Self, Error> {
        if page_size < 1 {
            return Err(Error::InvalidPageSize(page_size));
        }

        if page < 1 {
            return Err(Error::InvalidPage(page));
        }

        Ok(Self { page, page_size })
    }

    /// The 1-based page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    /// The maximum number of items on the page.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// The number of items that come before this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// Describes where a page sits within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// The exact number of items across all pages.
    pub total_items: u64,
    /// The number of pages needed to show every item.
    pub total_pages: u64,
    /// The requested page number.
    pub current_page: u64,
    /// The 1-based position of the first item on the page, 0 when there are no items.
    pub from: u64,
    /// The 1-based position of the last item on the page, 0 when there are no items.
    pub to: u64,
}

impl PageMeta {
    /// Compute the metadata for `request` given the exact `total_items`.
    ///
    /// A page past the last page is not an error, the metadata still
    /// describes the requested page so the caller can render it as empty.
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.page_size);

        let (from, to) = if total_items == 0 {
            (0, 0)
        } else {
            let last_on_page = request.page.saturating_mul(request.page_size);
            (
                request.offset().saturating_add(1),
                last_on_page.min(total_items),
            )
        };

        Self {
            total_items,
            total_pages,
            current_page: request.page,
            from,
            to,
        }
    }
}

/// One page of items with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// The items on the page. Empty, never missing, when there is no data.
    pub data: Vec<T>,
    /// Where the page sits in the full result set.
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    /// Wrap the items fetched for `request` out of `total_items` matches.
    pub fn new(data: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            data,
            meta: PageMeta::new(request, total_items),
        }
    }
}

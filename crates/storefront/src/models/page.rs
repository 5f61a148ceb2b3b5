//! List responses.
//!
//! List endpoints answer either with a paginated envelope
//! (`{"count", "next", "previous", "results"}`) or with a bare JSON array,
//! depending on whether pagination is enabled for the resource. Both shapes
//! deserialize into [`Page`].

use serde::Deserialize;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Listing<T>")]
pub struct Page<T> {
    /// Total number of matching records across all pages.
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Number of pages of `page_size` records needed for `count`, at least 1.
    #[must_use]
    pub fn total_pages(&self, page_size: u32) -> u64 {
        self.count.div_ceil(u64::from(page_size.max(1))).max(1)
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Paginated {
        count: u64,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Paginated {
                count,
                next,
                previous,
                results,
            } => Self {
                count,
                next,
                previous,
                results,
            },
            Listing::Bare(results) => Self {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            },
        }
    }
}

use serde::{Deserialize, Serialize};

/// A single page of results returned by a remote list endpoint.
///
/// The envelope carries the items plus the pagination bookkeeping the backend
/// reports; repository facades unwrap it into the bare item list before
/// handing results to the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
}

impl<T> Page<T> {
    /// Wraps a complete result set as a single page.
    pub fn single(list: Vec<T>) -> Self {
        let total = u64::try_from(list.len()).unwrap_or(u64::MAX);
        let page_size = u32::try_from(total).unwrap_or(u32::MAX);
        Self { list, total, page: 1, page_size, page_count: 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Common paging parameters shared by list queries across features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, page_size: 25, sort_by: None, order: SortOrder::Asc }
    }
}

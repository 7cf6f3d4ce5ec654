use serde::{Deserialize, Serialize};

use crate::config::MarketplaceConfig;

/// Requested page, 1-based. Missing values fall back to the configured defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Clamps the request to `1..` pages and `1..=max_page_size` items.
    pub fn resolve(self, config: &MarketplaceConfig) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size);
        (page, limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub pages: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Cuts one page out of an already filtered and sorted result set.
    pub fn slice(items: Vec<T>, request: PageRequest, config: &MarketplaceConfig) -> Self {
        let (current, limit) = request.resolve(config);
        let total = items.len() as u64;
        let pages = total.div_ceil(u64::from(limit)) as u32;
        let skip = (current as usize - 1).saturating_mul(limit as usize);

        let items = items
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .collect();

        Self {
            items,
            pagination: Pagination {
                current,
                pages,
                total,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

//! Page/limit query parameters and the `pagination` block returned by list endpoints.

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<i64>,
}

/// Query values that are not integers read as absent instead of rejecting the request.
pub(crate) fn lenient_number<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

/// Resolved window into an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageQuery {
    /// Missing or zero values take the defaults (page 1, [`DEFAULT_PAGE_SIZE`]);
    /// the limit is then clamped to `1..=MAX_PAGE_SIZE`.
    pub fn resolve(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .filter(|n| *n != 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl PageRequest {
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
}

impl Pagination {
    pub fn new(req: PageRequest, total: i64) -> Self {
        let pages = if total <= 0 {
            0
        } else {
            (total + req.limit - 1) / req.limit
        };
        Self {
            current: req.page,
            pages,
            total,
        }
    }
}

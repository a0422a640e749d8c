use serde::Serialize;

use super::error::{ApiError, ApiResult};
use crate::util::QueryParams;

const MAX_LIMIT: usize = 100;
/// Offsets are bound as SQLite integers.
const MAX_OFFSET: usize = i64::MAX as usize;

/// A requested page: `page` is 1-based, `limit` is the page size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    pub number: usize,
    pub limit: usize,
}

impl Page {
    pub fn from_params(params: &QueryParams, default_limit: usize) -> ApiResult<Page> {
        let number = match params.get("page") {
            None => 1,
            Some(p) => match p.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(ApiError::InvalidPage),
            },
        };

        let limit = params
            .get("limit")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&l| l > 0)
            .unwrap_or(default_limit)
            .min(MAX_LIMIT);

        match (number - 1).checked_mul(limit) {
            Some(offset) if offset <= MAX_OFFSET => Ok(Page { number, limit }),
            _ => Err(ApiError::InvalidPage),
        }
    }

    pub fn offset(&self) -> usize {
        self.number
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(MAX_OFFSET)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// `url` is the absolute url of the listing without query string.
    pub fn new(
        results: Vec<T>,
        count: usize,
        page: Page,
        url: &str,
        params: &QueryParams,
    ) -> ApiResult<Self> {
        if page.number > 1 && page.offset() >= count {
            return Err(ApiError::InvalidPage);
        }

        let link = |number: usize| {
            let query = if number == 1 {
                params.with("page", None)
            } else {
                params.with("page", Some(&number.to_string()))
            };
            if query.is_empty() {
                url.to_string()
            } else {
                format!("{}?{}", url, query)
            }
        };

        let next = (page.offset() + results.len() < count).then(|| link(page.number + 1));
        let previous = (page.number > 1).then(|| link(page.number - 1));

        Ok(Paginated {
            count,
            next,
            previous,
            results,
        })
    }
}

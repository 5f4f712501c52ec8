use serde::{Deserialize, Serialize};

/// Default page size when a query does not set one.
pub const DEFAULT_LIMIT: u32 = 20;

/// Query parameters accepted by the paginated list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Effective 1-based page number.
    #[must_use]
    pub fn page_or_first(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size.
    #[must_use]
    pub fn limit_or_default(&self) -> u32 {
        match self.limit {
            Some(0) | None => DEFAULT_LIMIT,
            Some(limit) => limit,
        }
    }

    /// Query pairs for the wire, skipping unset fields.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        pairs
    }
}

/// One page of a list endpoint's results.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    /// Number of pages at this limit.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        let pages = self.total.div_ceil(u64::from(self.limit));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// True when a page after this one exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Slices a full result set into the requested page.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], query: &ListQuery) -> Paginated<T> {
    let page = query.page_or_first();
    let limit = query.limit_or_default();
    let start = usize::try_from((page - 1) * limit).unwrap_or(usize::MAX);
    let page_items = items
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect();

    Paginated {
        items: page_items,
        total: items.len() as u64,
        page,
        limit,
    }
}

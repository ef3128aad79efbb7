use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Order, OrderStatus};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Order list filters. Every field is optional; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// Service slug.
    #[serde(default)]
    pub service: Option<String>,
    /// Catalog category slug.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    /// Inclusive creation-date bounds (UTC calendar days).
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if self.status.map_or(false, |status| status != order.status) {
            return false;
        }
        if self
            .service
            .as_deref()
            .map_or(false, |slug| slug != order.service.slug)
        {
            return false;
        }
        if self
            .category
            .as_deref()
            .map_or(false, |slug| slug != order.service.category)
        {
            return false;
        }
        let created_on = order.created_at.date_naive();
        if self.created_from.map_or(false, |from| created_on < from) {
            return false;
        }
        if self.created_to.map_or(false, |to| created_on > to) {
            return false;
        }
        self.search
            .as_deref()
            .map_or(true, |term| order.matches_search(term))
    }

    /// Filter and sort newest first (ties broken by id, descending).
    pub fn apply(&self, orders: Vec<Order>) -> Vec<Order> {
        let mut matched: Vec<Order> = orders
            .into_iter()
            .filter(|order| self.matches(order))
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matched
    }
}

/// 1-based page request. Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }

    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn slice<T>(self, items: Vec<T>) -> Page<T> {
        let request = self.normalized();
        let total = items.len();
        let offset = (request.page - 1).saturating_mul(request.per_page);
        let items = items
            .into_iter()
            .skip(offset)
            .take(request.per_page)
            .collect();
        Page {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages: total.div_ceil(request.per_page),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

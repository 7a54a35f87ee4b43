use serde::Serialize;
use sqlx::FromRow;

use crate::circulation::inventory::CopySet;

/// A book title together with its live copy inventory.
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: String,
    pub total_count: i32,
    pub available_count: i32,
    pub available_copies: CopySet,
}

impl Book {
    /// Inventory invariant: the counter always matches the free set, and
    /// never escapes `0..=total_count`.
    pub fn inventory_consistent(&self) -> bool {
        self.available_count as usize == self.available_copies.len()
            && self.available_count >= 0
            && self.available_count <= self.total_count
    }
}

#[derive(Debug, FromRow, Serialize)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: String,
    pub total_count: i32,
    pub available_count: i32,
}

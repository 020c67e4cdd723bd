//! Pagination window for list and search operations
//!
//! Negative page numbers and non-positive page sizes are rejected at the HTTP
//! boundary, so the window itself only deals in unsigned values.

use serde::{Deserialize, Serialize};

/// A zero-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Zero-based page number.
    pub number: u32,
    /// Number of documents per page, always positive.
    pub size: u32,
}

impl Page {
    pub fn new(number: u32, size: u32) -> Self {
        Self { number, size }
    }

    /// First page with the given size.
    pub fn first(size: u32) -> Self {
        Self { number: 0, size }
    }

    /// Offset of the first document in this window.
    pub fn offset(&self) -> u64 {
        u64::from(self.number) * u64::from(self.size)
    }
}

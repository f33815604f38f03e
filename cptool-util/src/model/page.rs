use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// Rows extracted from one listing page, in page order.
#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Zero-based position of the page within its stream.
    #[get_copy = "pub"]
    index: usize,
    #[get = "pub"]
    rows: Vec<T>,
    #[get_copy = "pub"]
    has_next: bool,
}

impl<T> Page<T> {
    pub fn new(index: usize, rows: Vec<T>, has_next: bool) -> Self {
        Self {
            index,
            rows,
            has_next,
        }
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

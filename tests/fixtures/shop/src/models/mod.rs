pub mod order;
pub mod user;

use serde::Serialize;

/// One page of results
#[derive(Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub next_cursor: Option<String>,
}

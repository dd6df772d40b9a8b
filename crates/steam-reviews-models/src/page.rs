use serde::{Deserialize, Serialize};

/// Cursor value that asks a source for its first page
pub const FIRST_PAGE_CURSOR: &str = "*";

/// One record as a source delivers it, before normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawReview {
    pub author_id: Option<String>,
    pub body: Option<String>,
    pub recommended: Option<bool>,
    pub timestamp_created: Option<i64>, // Unix epoch seconds
    pub playtime_minutes: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewPage {
    pub reviews: Vec<RawReview>,
    pub next_cursor: Option<String>,
}

impl ReviewPage {
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

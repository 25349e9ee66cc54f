use serde::{Deserialize, Serialize};

/// Live price snapshot, fetched fresh for every evaluation and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub current_price: f64,
}

/// A news article, already cleaned up for display and prompting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub datetime: i64,
    pub image: String,
    pub category: String,
    pub related: String,
}

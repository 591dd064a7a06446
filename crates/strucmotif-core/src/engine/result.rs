use super::query::MotifSearchQuery;
use super::scoring::Hit;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timings {
    pub assembly: Duration,
    pub scoring: Duration,
    pub total: Duration,
}

/// Ranked hits of one search together with the query that produced them.
#[derive(Debug, Clone)]
pub struct MotifSearchResult {
    pub query: MotifSearchQuery,
    pub hits: Vec<Hit>,
    pub timings: Timings,
}

impl MotifSearchResult {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

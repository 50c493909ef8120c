//! On-the-fly search over the seed table
//!
//! No persistent index: every query is a full scan with a case-insensitive
//! substring match, ranked by each seed's most recent appearance. Fine at
//! journal scale; the scale limit is documented, not accidental.

use crate::types::{Seed, SeedId};
use chrono::NaiveDate;
use serde::Serialize;

/// Maximum number of hits a query returns
pub const SEARCH_LIMIT: usize = 5;

/// One search hit: the matching seed and the day that represents it
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: SeedId,
    pub text: String,
    /// Most recent appearance; `None` only for records that predate the
    /// non-empty-appearance invariant. Ranked last.
    pub day: Option<NaiveDate>,
}

/// Rank `seeds` against `query`: case-insensitive substring match, newest
/// last-appearance first, truncated to [`SEARCH_LIMIT`].
pub fn rank(seeds: &[Seed], query: &str) -> Vec<SearchHit> {
    let needle = query.to_lowercase();
    let mut hits: Vec<SearchHit> = seeds
        .iter()
        .filter(|seed| seed.text.to_lowercase().contains(&needle))
        .map(|seed| SearchHit {
            id: seed.id.clone(),
            text: seed.text.clone(),
            day: seed.last_appeared(),
        })
        .collect();
    hits.sort_by(|a, b| b.day.cmp(&a.day));
    hits.truncate(SEARCH_LIMIT);
    hits
}

//! Grouping of match results for review

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::MatchResult;

/// Ranked candidates for one incoming line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchGroup {
    pub input_line: usize,
    /// Sorted by non-increasing score
    pub candidates: Vec<MatchResult>,
}

impl MatchGroup {
    /// Best candidate; its incoming record seeds the merged output
    pub fn top(&self) -> Option<&MatchResult> {
        self.candidates.first()
    }

    pub fn candidate(&self, master_id: &str) -> Option<&MatchResult> {
        self.candidates.iter().find(|c| c.master_id == master_id)
    }
}

/// Group results by incoming line
///
/// Each group is sorted by descending score (stable, ties keep matcher order)
/// and truncated to `max_candidates`; `0` keeps every candidate. Groups come
/// back in ascending line order with unique lines.
pub fn group_results(results: Vec<MatchResult>, max_candidates: usize) -> Vec<MatchGroup> {
    let mut by_line: BTreeMap<usize, Vec<MatchResult>> = BTreeMap::new();
    for result in results {
        by_line.entry(result.incoming.input_line).or_default().push(result);
    }

    by_line
        .into_iter()
        .map(|(input_line, mut candidates)| {
            candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
            if max_candidates > 0 {
                candidates.truncate(max_candidates);
            }
            MatchGroup {
                input_line,
                candidates,
            }
        })
        .collect()
}

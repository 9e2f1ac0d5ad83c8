//! Result fusion across expanded queries

use std::collections::HashMap;

use crate::vector::Match;

/// Best-scoring match per id across any number of result lists
#[derive(Debug, Clone, Default)]
pub struct FusedMatchSet {
    best: HashMap<String, Match>,
}

impl FusedMatchSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `candidate` if its id is new or it strictly beats the stored score.
    /// Returns whether the set changed.
    pub fn insert(&mut self, candidate: Match) -> bool {
        match self.best.get(&candidate.id) {
            Some(existing) if candidate.score <= existing.score => false,
            _ => {
                self.best.insert(candidate.id.clone(), candidate);
                true
            }
        }
    }

    /// Fold one per-query result list into the set
    pub fn extend(&mut self, matches: impl IntoIterator<Item = Match>) {
        for candidate in matches {
            self.insert(candidate);
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Match> {
        self.best.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.best.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Matches sorted by descending score (ties by id), truncated to `limit`
    #[must_use]
    pub fn into_ranked(self, limit: usize) -> Vec<Match> {
        let mut ranked: Vec<Match> = self.best.into_values().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        ranked.truncate(limit);
        ranked
    }
}

/// Fuse per-query result lists into one set
pub fn fuse(lists: impl IntoIterator<Item = Vec<Match>>) -> FusedMatchSet {
    let mut fused = FusedMatchSet::new();
    for list in lists {
        fused.extend(list);
    }
    fused
}

use std::cmp::Ordering;

use crate::model::types::LeaderboardEntry;

pub const MAX_ENTRIES: usize = 5;

/// Higher score first, then higher accuracy, then lower average time.
pub fn rank(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.accuracy.cmp(&a.accuracy))
        .then_with(|| a.average_time.cmp(&b.average_time))
}

/// Add `entry`, re-rank and keep the top [`MAX_ENTRIES`]. The sort is stable,
/// so an entry that ties an existing one lands after it.
pub fn insert_ranked(
    mut entries: Vec<LeaderboardEntry>,
    entry: LeaderboardEntry,
) -> Vec<LeaderboardEntry> {
    entries.push(entry);
    entries.sort_by(rank);
    entries.truncate(MAX_ENTRIES);
    entries
}

/// Whether `entry` would make it onto `entries`.
pub fn qualifies(entries: &[LeaderboardEntry], entry: &LeaderboardEntry) -> bool {
    entries.len() < MAX_ENTRIES
        || entries
            .last()
            .is_some_and(|last| rank(entry, last) == Ordering::Less)
}

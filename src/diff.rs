//! # Diff
//! Which of the current records were not seen in the last snapshot.
//!
//! Identity is the exact title string (case-sensitive, no whitespace or
//! punctuation folding). A cosmetic title edit upstream therefore shows up
//! as a new update.

use std::collections::HashSet;

use crate::ingest::types::UpdateRecord;

/// Records of `current` whose title is absent from `last`, in original order.
/// Duplicates within `current` are kept; O(n + m).
pub fn new_updates(current: &[UpdateRecord], last: &[UpdateRecord]) -> Vec<UpdateRecord> {
    let seen: HashSet<&str> = last.iter().map(|u| u.title.as_str()).collect();
    current
        .iter()
        .filter(|u| !seen.contains(u.title.as_str()))
        .cloned()
        .collect()
}

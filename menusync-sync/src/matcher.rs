//! Content matching of sibling lists
//!
//! Decides, for two ordered lists of nodes, which entries are kept, which are
//! new and which have to go. Matching is purely by content key: position is
//! ignored, so a reorder alone keeps everything.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use menusync_menu::MenuNode;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::errors::{Result, SyncError};

/// Classification of one entry in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchState {
    /// Present on both sides
    Kept,
    /// Only in the new list
    Added,
    /// Only in the old list
    Removed,
}

/// Result of matching an old list against a new list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// One entry per old node: `Kept` or `Removed`
    pub old_states: Vec<MatchState>,
    /// One entry per new node: `Kept` or `Added`
    pub new_states: Vec<MatchState>,
    /// `(old_index, new_index)` for every kept entry, in old-list order
    pairs: Vec<(usize, usize)>,
}

impl MatchResult {
    /// Kept pairs, after checking both sides agree on how many were kept
    pub fn kept_pairs(&self) -> Result<&[(usize, usize)]> {
        let old_kept = count(&self.old_states, MatchState::Kept);
        let new_kept = count(&self.new_states, MatchState::Kept);

        if old_kept != new_kept || old_kept != self.pairs.len() {
            return Err(SyncError::IdentityMismatch { old_kept, new_kept });
        }
        Ok(&self.pairs)
    }

    /// Indices into the old list that must be deleted
    pub fn removed_indices(&self) -> Vec<usize> {
        indices(&self.old_states, MatchState::Removed)
    }

    /// Indices into the new list that must be created
    pub fn added_indices(&self) -> Vec<usize> {
        indices(&self.new_states, MatchState::Added)
    }

    pub fn kept_count(&self) -> usize {
        count(&self.old_states, MatchState::Kept)
    }

    /// True when neither side needs a remote command
    pub fn is_unchanged(&self) -> bool {
        self.old_states.iter().all(|s| *s == MatchState::Kept)
            && self.new_states.iter().all(|s| *s == MatchState::Kept)
    }
}

fn count(states: &[MatchState], wanted: MatchState) -> usize {
    states.iter().filter(|s| **s == wanted).count()
}

fn indices(states: &[MatchState], wanted: MatchState) -> Vec<usize> {
    states
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == wanted)
        .map(|(i, _)| i)
        .collect()
}

/// Match two key sequences
///
/// Returns `None` when both are empty. For every key the first
/// `min(count_old, count_new)` occurrences on each side are kept and the
/// i-th kept old occurrence pairs with the i-th kept new occurrence.
pub fn match_keys<K: Eq + Hash>(old: &[K], new: &[K]) -> Option<MatchResult> {
    if old.is_empty() && new.is_empty() {
        return None;
    }

    let mut new_counts: HashMap<&K, usize> = HashMap::new();
    for key in new {
        *new_counts.entry(key).or_insert(0) += 1;
    }

    // Old side: keep while the new side still has an unclaimed occurrence
    let mut old_states = Vec::with_capacity(old.len());
    let mut kept_old: HashMap<&K, VecDeque<usize>> = HashMap::new();
    for (index, key) in old.iter().enumerate() {
        match new_counts.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                kept_old.entry(key).or_default().push_back(index);
                old_states.push(MatchState::Kept);
            }
            _ => old_states.push(MatchState::Removed),
        }
    }

    let mut new_states = Vec::with_capacity(new.len());
    let mut pairs = Vec::new();
    for (index, key) in new.iter().enumerate() {
        match kept_old.get_mut(key).and_then(VecDeque::pop_front) {
            Some(old_index) => {
                pairs.push((old_index, index));
                new_states.push(MatchState::Kept);
            }
            None => new_states.push(MatchState::Added),
        }
    }
    pairs.sort_unstable();

    Some(MatchResult {
        old_states,
        new_states,
        pairs,
    })
}

/// Match two sibling lists by content key
pub fn match_nodes(old: &[MenuNode], new: &[MenuNode]) -> Option<MatchResult> {
    let old_keys: Vec<_> = old.iter().map(MenuNode::content_key).collect();
    let new_keys: Vec<_> = new.iter().map(MenuNode::content_key).collect();

    let result = match_keys(&old_keys, &new_keys)?;
    trace!(
        "Matched {} old / {} new nodes: {} kept, {} removed, {} added",
        old.len(),
        new.len(),
        result.kept_count(),
        result.old_states.len() - result.kept_count(),
        result.new_states.len() - result.kept_count()
    );
    Some(result)
}

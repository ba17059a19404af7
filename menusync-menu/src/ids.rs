//! Remote identifiers and their allocation

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::node::MenuNode;
use crate::tree::walk;

/// Handle the head unit uses to refer to a menu entry
///
/// Echoed back by the host in selection events, so it must survive a node
/// being replaced by an equal-content node in a later update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub u32);

impl RemoteId {
    /// Sentinel for a node that has never been sent
    pub const UNSET: RemoteId = RemoteId(2_000_000_000);

    pub fn is_set(self) -> bool {
        self != Self::UNSET
    }
}

impl Default for RemoteId {
    fn default() -> Self {
        Self::UNSET
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("unset")
        }
    }
}

/// Monotonic source of fresh remote ids, shared by every operation of one
/// menu manager
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u32) -> Self {
        let first = if first == 0 || first >= RemoteId::UNSET.0 {
            1
        } else {
            first
        };
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Allocator that never hands out an id already used in `menu`
    pub fn following(menu: &[MenuNode]) -> Self {
        let mut highest = 0;
        walk(menu, &mut |node| {
            if node.remote_id.is_set() {
                highest = highest.max(node.remote_id.0);
            }
        });
        Self::starting_at(highest.saturating_add(1))
    }

    /// Hand out the next id, wrapping before the unset sentinel
    pub fn next_id(&self) -> RemoteId {
        let previous = self
            .next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                let next = current + 1;
                Some(if next >= RemoteId::UNSET.0 { 1 } else { next })
            })
            .unwrap_or(1);
        RemoteId(previous)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Give `node` and its whole subtree fresh ids
pub fn assign_fresh_ids(node: &mut MenuNode, allocator: &IdAllocator) {
    node.remote_id = allocator.next_id();
    for child in &mut node.children {
        assign_fresh_ids(child, allocator);
    }
}

//! Reconciliation results and statistics

use chrono::{DateTime, Utc};
use menusync_menu::MenuNode;
use serde::{Deserialize, Serialize};

/// Counters collected over one reconciliation episode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub nodes_kept: usize,
    pub nodes_added: usize,
    pub nodes_removed: usize,
    /// Sibling lists visited, root included
    pub levels_visited: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub commands_sent: usize,
    pub artworks_requested: usize,
    pub artworks_failed: usize,
}

impl ReconcileStats {
    /// True when no structural command was needed
    pub fn is_noop(&self) -> bool {
        self.commands_sent == 0
    }
}

/// Result delivered when an operation finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub operation_id: u64,
    /// AND of every remote step's success
    pub success: bool,
    /// The menu as the host is now believed to show it
    pub menu: Vec<MenuNode>,
    pub stats: ReconcileStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

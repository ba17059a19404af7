//! Error types for reconciliation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Kept node mismatch: {old_kept} old vs {new_kept} new")]
    IdentityMismatch { old_kept: usize, new_kept: usize },

    #[error("Match result does not fit the menus: {0}")]
    MatchMismatch(String),

    #[error("Invalid state transition: from {from:?} to {to:?}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Menu manager is shut down")]
    ManagerClosed,

    #[error("Operation task failed: {0}")]
    TaskFailed(String),

    #[error("Frame error: {0}")]
    Frame(#[from] menusync_proto::FrameError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

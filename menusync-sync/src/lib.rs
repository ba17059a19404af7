//! Menu reconciliation engine for menusync
//!
//! This crate provides the machinery that keeps the head unit's menu equal
//! to the application's desired menu:
//! - Content matching of old and new sibling lists
//! - Remote identity transfer onto kept nodes
//! - Artwork prefetch before structural commands
//! - The cancelable reconciliation operation and its state machine
//! - A manager that supersedes in-flight operations with newer targets

pub mod config;
pub mod errors;
pub mod identity;
pub mod manager;
pub mod matcher;
pub mod operation;
pub mod prefetch;
pub mod report;
pub mod state;
pub mod transport;

pub use config::SyncConfig;
pub use errors::{Result, SyncError};
pub use identity::transfer_identities;
pub use manager::MenuManager;
pub use matcher::{match_keys, match_nodes, MatchResult, MatchState};
pub use operation::{CompletionCallback, OperationHandle, ReconcileOutcome, ReconciliationOperation};
pub use prefetch::{AssetPrefetcher, PrefetchReport};
pub use report::{ReconcileReport, ReconcileStats};
pub use state::OperationState;
pub use transport::{AssetUploader, RemoteChannel};

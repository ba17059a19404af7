//! Cancelable reconciliation of one menu update
//!
//! An operation owns a snapshot of what the host currently shows and the
//! target the application wants. It walks the tree one sibling list at a
//! time:
//! 1. Match old against new by content key
//! 2. Transfer remote ids onto kept nodes, allocate ids for added ones
//! 3. Prefetch artworks (root level only, covers the whole target)
//! 4. Delete removed nodes, then add new ones
//! 5. Recurse into each kept submenu, strictly one after another
//!
//! Every remote batch is awaited before the next is issued. Cancellation is
//! checked between steps; once observed nothing more is sent and the
//! completion callback is dropped without being called.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use menusync_menu::command::{add_commands, delete_commands, submenu_commands};
use menusync_menu::{
    assign_fresh_ids, level_mut, replace_level, IdAllocator, MenuNode, RemoteCommand, RemoteId,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::errors::{Result, SyncError};
use crate::identity::transfer_identities;
use crate::matcher::{match_nodes, MatchResult, MatchState};
use crate::prefetch::AssetPrefetcher;
use crate::report::{ReconcileReport, ReconcileStats};
use crate::state::OperationState;
use crate::transport::{AssetUploader, RemoteChannel};

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Called once when an operation finishes; never called for a canceled one
pub type CompletionCallback = Box<dyn FnOnce(&ReconcileReport) + Send + 'static>;

/// How an operation ended
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    Finished(ReconcileReport),
    /// Abandoned after a cancel request; no callback was invoked
    Canceled,
}

impl ReconcileOutcome {
    pub fn report(&self) -> Option<&ReconcileReport> {
        match self {
            ReconcileOutcome::Finished(report) => Some(report),
            ReconcileOutcome::Canceled => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, ReconcileOutcome::Canceled)
    }
}

/// Shared view of a running operation, used to observe and cancel it
#[derive(Clone)]
pub struct OperationHandle {
    id: u64,
    state: Arc<RwLock<OperationState>>,
    cancel: CancellationToken,
    committed: Arc<RwLock<Vec<MenuNode>>>,
}

impl OperationHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn state(&self) -> OperationState {
        *self.state.read().await
    }

    /// Request cancellation
    ///
    /// Returns false when the operation already reached a terminal state.
    pub async fn cancel(&self) -> bool {
        let mut state = self.state.write().await;
        if state.transition(OperationState::Canceled).is_err() {
            return false;
        }
        self.cancel.cancel();
        debug!("Operation {} cancel requested", self.id);
        true
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The menu as the host is believed to show it right now
    ///
    /// Updated as remote batches succeed, so after a cancel this is the base
    /// the next operation should start from.
    pub async fn committed_menu(&self) -> Vec<MenuNode> {
        self.committed.read().await.clone()
    }
}

/// Why a level stopped early
enum Halt {
    Canceled,
    Failed(SyncError),
}

impl From<SyncError> for Halt {
    fn from(err: SyncError) -> Self {
        Halt::Failed(err)
    }
}

type Step<T> = std::result::Result<T, Halt>;

/// Which add batches of one level reached the host
#[derive(Debug, Clone, Copy)]
struct AddOutcome {
    /// The added nodes themselves
    created: bool,
    /// Everything beneath them
    nested: bool,
}

impl AddOutcome {
    const COMPLETE: AddOutcome = AddOutcome {
        created: true,
        nested: true,
    };

    fn succeeded(self) -> bool {
        self.created && self.nested
    }
}

/// Everything a level needs; shared by reference across the recursion
struct Engine {
    handle: OperationHandle,
    channel: Arc<dyn RemoteChannel>,
    prefetcher: Option<AssetPrefetcher>,
    ids: Arc<IdAllocator>,
    config: SyncConfig,
}

/// One cancelable menu update
pub struct ReconciliationOperation {
    engine: Engine,
    uploader: Option<Arc<dyn AssetUploader>>,
    target: Vec<MenuNode>,
    on_complete: Option<CompletionCallback>,
}

impl ReconciliationOperation {
    /// Create an operation replacing `current` with `target`
    pub fn new(
        current: Vec<MenuNode>,
        target: Vec<MenuNode>,
        channel: Arc<dyn RemoteChannel>,
        ids: Arc<IdAllocator>,
        config: SyncConfig,
    ) -> Self {
        let handle = OperationHandle {
            id: NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed),
            state: Arc::new(RwLock::new(OperationState::Queued)),
            cancel: CancellationToken::new(),
            committed: Arc::new(RwLock::new(current)),
        };

        Self {
            engine: Engine {
                handle,
                channel,
                prefetcher: None,
                ids,
                config,
            },
            uploader: None,
            target,
            on_complete: None,
        }
    }

    /// Upload artworks through `uploader` before sending commands
    pub fn with_uploader(mut self, uploader: Arc<dyn AssetUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn with_completion(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }

    pub fn handle(&self) -> OperationHandle {
        self.engine.handle.clone()
    }

    /// Run the operation to completion or cancellation
    ///
    /// `Err` is reserved for broken internal invariants; remote failures end
    /// as a finished report with `success == false`.
    pub async fn run(self) -> Result<ReconcileOutcome> {
        let Self {
            mut engine,
            uploader,
            target,
            on_complete,
        } = self;
        let id = engine.handle.id;

        {
            let mut state = engine.handle.state.write().await;
            if engine.handle.cancel.is_cancelled() {
                info!("Operation {} canceled before start", id);
                return Ok(ReconcileOutcome::Canceled);
            }
            state.transition(OperationState::Running)?;
        }

        if engine.config.prefetch_artworks {
            engine.prefetcher = uploader.map(AssetPrefetcher::new);
        }

        let started_at = Utc::now();
        let current = engine.handle.committed_menu().await;
        info!(
            "Operation {} started: {} current -> {} target top-level entries",
            id,
            current.len(),
            target.len()
        );

        let mut stats = ReconcileStats::default();
        let success = match engine.reconcile_level(current, target, Vec::new(), &mut stats).await {
            Ok(success) => success,
            Err(Halt::Canceled) => {
                info!("Operation {} canceled", id);
                return Ok(ReconcileOutcome::Canceled);
            }
            Err(Halt::Failed(err)) => {
                error!("Operation {} aborted: {}", id, err);
                let mut state = engine.handle.state.write().await;
                if !state.is_terminal() {
                    state.transition(OperationState::Finished)?;
                }
                return Err(err);
            }
        };

        {
            let mut state = engine.handle.state.write().await;
            if engine.handle.cancel.is_cancelled() {
                info!("Operation {} canceled before completion", id);
                return Ok(ReconcileOutcome::Canceled);
            }
            state.transition(OperationState::Finished)?;
        }

        let report = ReconcileReport {
            operation_id: id,
            success,
            menu: engine.handle.committed_menu().await,
            stats,
            started_at,
            finished_at: Utc::now(),
        };

        if success {
            info!(
                "Operation {} finished: {} kept, {} added, {} removed in {} batches",
                id,
                report.stats.nodes_kept,
                report.stats.nodes_added,
                report.stats.nodes_removed,
                report.stats.batches_sent
            );
        } else {
            warn!(
                "Operation {} finished with {} failed batches",
                id, report.stats.batches_failed
            );
        }

        if let Some(callback) = on_complete {
            callback(&report);
        }
        Ok(ReconcileOutcome::Finished(report))
    }
}

impl Engine {
    fn checkpoint(&self) -> Step<()> {
        if self.handle.cancel.is_cancelled() {
            return Err(Halt::Canceled);
        }
        Ok(())
    }

    /// Reconcile one sibling list and, after it, every kept submenu below it
    ///
    /// `path` holds the remote ids of the ancestors, root first.
    fn reconcile_level<'a>(
        &'a self,
        mut old: Vec<MenuNode>,
        mut new: Vec<MenuNode>,
        path: Vec<RemoteId>,
        stats: &'a mut ReconcileStats,
    ) -> BoxFuture<'a, Step<bool>> {
        async move {
            self.checkpoint()?;
            stats.levels_visited += 1;

            let Some(matched) = match_nodes(&old, &new) else {
                debug!("Level {:?} is empty on both sides", path);
                return Ok(true);
            };

            transfer_identities(&old, &mut new, &matched)?;
            let pairs = matched.kept_pairs()?.to_vec();
            let removed = matched.removed_indices();
            let added = matched.added_indices();
            for &index in &added {
                assign_fresh_ids(&mut new[index], &self.ids);
            }

            stats.nodes_kept += pairs.len();
            stats.nodes_removed += removed.len();
            stats.nodes_added += added.len();
            debug!(
                "Level {:?}: {} kept, {} to remove, {} to add",
                path,
                pairs.len(),
                removed.len(),
                added.len()
            );

            if path.is_empty() {
                self.prefetch(&new, stats).await;
            }

            self.checkpoint()?;
            let to_remove: Vec<&MenuNode> = removed.iter().map(|&i| &old[i]).collect();
            let removed_ok = self.send_deletes(&to_remove, stats).await;
            if removed_ok && !to_remove.is_empty() {
                self.commit_removals(&path, &to_remove).await;
            }

            self.checkpoint()?;
            let parent_id = path.last().copied();
            let adds = self.send_adds(&new, &added, parent_id, stats).await;
            if !adds.succeeded() {
                error!("Error sending menu entries at level {:?}", path);
            }
            self.commit_level(&path, &old, &new, &matched, &pairs, removed_ok, adds)
                .await;

            let mut success = removed_ok && adds.succeeded();
            for (old_index, new_index) in pairs {
                self.checkpoint()?;
                if old[old_index].children.is_empty() && new[new_index].children.is_empty() {
                    continue;
                }

                let mut child_path = path.clone();
                child_path.push(new[new_index].remote_id);
                let old_children = std::mem::take(&mut old[old_index].children);
                let new_children = std::mem::take(&mut new[new_index].children);
                success &= self
                    .reconcile_level(old_children, new_children, child_path, stats)
                    .await?;
            }

            Ok(success)
        }
        .boxed()
    }

    async fn prefetch(&self, target: &[MenuNode], stats: &mut ReconcileStats) {
        let Some(prefetcher) = &self.prefetcher else {
            return;
        };
        let report = prefetcher.prefetch(target).await;
        stats.artworks_requested += report.requested.len();
        stats.artworks_failed += report.failed.len();
    }

    async fn send(&self, commands: &[RemoteCommand], stats: &mut ReconcileStats) -> bool {
        stats.batches_sent += 1;
        stats.commands_sent += commands.len();

        match self.channel.send_batch(commands).await {
            Ok(()) => true,
            Err(err) => {
                stats.batches_failed += 1;
                warn!("Batch of {} commands failed: {}", commands.len(), err);
                false
            }
        }
    }

    async fn send_deletes(&self, nodes: &[&MenuNode], stats: &mut ReconcileStats) -> bool {
        if nodes.is_empty() {
            return true;
        }

        let commands = delete_commands(nodes.iter().copied());
        let ok = self.send(&commands, stats).await;
        if ok {
            debug!("Deleted {} old menu entries", nodes.len());
        } else {
            warn!("Unable to delete all old menu entries");
        }
        ok
    }

    /// Send the added nodes, then everything beneath them
    async fn send_adds(
        &self,
        level: &[MenuNode],
        added: &[usize],
        parent_id: Option<RemoteId>,
        stats: &mut ReconcileStats,
    ) -> AddOutcome {
        if added.is_empty() {
            debug!("There are no menu entries to add");
            return AddOutcome::COMPLETE;
        }

        let layout = self.config.default_submenu_layout;
        let main = add_commands(level, added, parent_id, layout);
        if !self.send(&main, stats).await {
            error!("Failed to send main menu commands");
            return AddOutcome {
                created: false,
                nested: false,
            };
        }

        let nested = submenu_commands(level, added, layout);
        if nested.is_empty() {
            return AddOutcome::COMPLETE;
        }
        let ok = self.send(&nested, stats).await;
        if !ok {
            error!("Failed to send sub menu commands");
        }
        AddOutcome {
            created: true,
            nested: ok,
        }
    }

    async fn commit_removals(&self, path: &[RemoteId], removed: &[&MenuNode]) {
        let gone: HashSet<RemoteId> = removed.iter().map(|n| n.remote_id).collect();
        let mut committed = self.handle.committed.write().await;
        let Some(level) = level_mut(&mut committed, path) else {
            warn!("Committed menu has no level at {:?}", path);
            return;
        };

        let remaining = level
            .iter()
            .filter(|n| !gone.contains(&n.remote_id))
            .cloned()
            .collect();
        replace_level(&mut committed, path, remaining);
    }

    /// Record the level as the host now shows it
    ///
    /// Kept nodes take the target's fields but keep their committed children
    /// until their own recursion replaces them. Added nodes appear once
    /// their own batch succeeded, without children if the batch beneath them
    /// failed. Removed nodes stay if their delete failed.
    #[allow(clippy::too_many_arguments)]
    async fn commit_level(
        &self,
        path: &[RemoteId],
        old: &[MenuNode],
        new: &[MenuNode],
        matched: &MatchResult,
        pairs: &[(usize, usize)],
        removed_ok: bool,
        adds: AddOutcome,
    ) {
        let mut partner = vec![None; new.len()];
        for &(old_index, new_index) in pairs {
            partner[new_index] = Some(old_index);
        }

        let mut level = Vec::with_capacity(new.len());
        for (index, node) in new.iter().enumerate() {
            match (matched.new_states[index], partner[index]) {
                (MatchState::Kept, Some(old_index)) => {
                    let mut node = node.clone();
                    node.set_children(old[old_index].children.clone());
                    level.push(node);
                }
                (MatchState::Added, _) if adds.created => {
                    let mut node = node.clone();
                    if !adds.nested {
                        node.set_children(Vec::new());
                    }
                    level.push(node);
                }
                _ => {}
            }
        }
        if !removed_ok {
            level.extend(matched.removed_indices().into_iter().map(|i| old[i].clone()));
        }

        let mut committed = self.handle.committed.write().await;
        if !replace_level(&mut committed, path, level) {
            warn!("Committed menu has no level at {:?}", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        batches: Mutex<Vec<Vec<RemoteCommand>>>,
    }

    #[async_trait]
    impl RemoteChannel for Recorder {
        async fn send_batch(&self, commands: &[RemoteCommand]) -> Result<()> {
            self.batches.lock().unwrap().push(commands.to_vec());
            Ok(())
        }
    }

    fn operation(
        current: Vec<MenuNode>,
        target: Vec<MenuNode>,
        channel: Arc<Recorder>,
    ) -> ReconciliationOperation {
        ReconciliationOperation::new(
            current,
            target,
            channel,
            Arc::new(IdAllocator::starting_at(100)),
            SyncConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_menus_send_nothing() {
        let channel = Arc::new(Recorder::default());
        let outcome = operation(vec![], vec![], channel.clone()).run().await.unwrap();

        let report = outcome.report().unwrap();
        assert!(report.success);
        assert!(report.menu.is_empty());
        assert!(channel.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let channel = Arc::new(Recorder::default());
        let op = operation(vec![], vec![MenuNode::new("A")], channel);
        let handle = op.handle();

        assert_eq!(handle.state().await, OperationState::Queued);
        op.run().await.unwrap();
        assert_eq!(handle.state().await, OperationState::Finished);
        assert!(!handle.cancel().await);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let channel = Arc::new(Recorder::default());
        let called = Arc::new(Mutex::new(false));
        let flag = called.clone();

        let op = operation(vec![], vec![MenuNode::new("A")], channel.clone())
            .with_completion(Box::new(move |_: &ReconcileReport| *flag.lock().unwrap() = true));
        let handle = op.handle();

        assert!(handle.cancel().await);
        let outcome = op.run().await.unwrap();

        assert!(outcome.is_canceled());
        assert_eq!(handle.state().await, OperationState::Canceled);
        assert!(channel.batches.lock().unwrap().is_empty());
        assert!(!*called.lock().unwrap());
    }

    #[tokio::test]
    async fn test_new_nodes_get_fresh_ids() {
        let channel = Arc::new(Recorder::default());
        let outcome = operation(
            vec![],
            vec![MenuNode::new("A"), MenuNode::new("B").with_children(vec![MenuNode::new("C")])],
            channel,
        )
        .run()
        .await
        .unwrap();

        let menu = &outcome.report().unwrap().menu;
        assert_eq!(menu[0].remote_id, RemoteId(100));
        assert_eq!(menu[1].remote_id, RemoteId(101));
        assert_eq!(menu[1].children[0].remote_id, RemoteId(102));
    }
}

//! Owner of the latest desired menu
//!
//! The manager keeps at most one operation in flight. A newer target cancels
//! the running operation, waits for it to stop, and starts from whatever the
//! host was left showing.

use std::sync::Arc;

use menusync_menu::{assign_disambiguators, find_by_remote_id, IdAllocator, MenuNode, RemoteId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::errors::{Result, SyncError};
use crate::operation::{
    CompletionCallback, OperationHandle, ReconcileOutcome, ReconciliationOperation,
};
use crate::transport::{AssetUploader, RemoteChannel};

struct InFlight {
    handle: OperationHandle,
    task: JoinHandle<Result<ReconcileOutcome>>,
}

struct Inner {
    /// Committed menu as of the last operation that stopped
    current: Vec<MenuNode>,
    in_flight: Option<InFlight>,
    closed: bool,
}

/// Serializes menu updates against one head unit
pub struct MenuManager {
    channel: Arc<dyn RemoteChannel>,
    uploader: Option<Arc<dyn AssetUploader>>,
    ids: Arc<IdAllocator>,
    config: SyncConfig,
    inner: Mutex<Inner>,
}

impl MenuManager {
    pub fn new(config: SyncConfig, channel: Arc<dyn RemoteChannel>) -> Self {
        Self {
            channel,
            uploader: None,
            ids: Arc::new(IdAllocator::new()),
            config,
            inner: Mutex::new(Inner {
                current: Vec::new(),
                in_flight: None,
                closed: false,
            }),
        }
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn AssetUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Share an id allocator, e.g. with other menus on the same host
    pub fn with_id_allocator(mut self, ids: Arc<IdAllocator>) -> Self {
        self.ids = ids;
        self
    }

    /// Replace the desired menu
    ///
    /// Any running operation is canceled and awaited first, so batches from
    /// two operations never interleave on the channel.
    pub async fn update_menu(
        &self,
        mut target: Vec<MenuNode>,
        on_complete: Option<CompletionCallback>,
    ) -> Result<OperationHandle> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(SyncError::ManagerClosed);
        }

        if self.config.disambiguate_titles {
            assign_disambiguators(&mut target);
        }

        if let Some(previous) = inner.in_flight.take() {
            if previous.handle.cancel().await {
                debug!("Superseding operation {}", previous.handle.id());
            }
            inner.current = Self::stop(previous).await;
        }

        let mut operation = ReconciliationOperation::new(
            inner.current.clone(),
            target,
            self.channel.clone(),
            self.ids.clone(),
            self.config.clone(),
        );
        if let Some(uploader) = &self.uploader {
            operation = operation.with_uploader(uploader.clone());
        }
        if let Some(callback) = on_complete {
            operation = operation.with_completion(callback);
        }

        let handle = operation.handle();
        info!("Scheduling menu operation {}", handle.id());
        let task = tokio::spawn(operation.run());
        inner.in_flight = Some(InFlight {
            handle: handle.clone(),
            task,
        });

        Ok(handle)
    }

    /// Wait for the in-flight operation, if any, and return how it ended
    pub async fn settle(&self) -> Result<Option<ReconcileOutcome>> {
        let mut inner = self.inner.lock().await;
        let Some(InFlight { handle, task }) = inner.in_flight.take() else {
            return Ok(None);
        };

        let outcome = task
            .await
            .map_err(|e| SyncError::TaskFailed(e.to_string()))?;
        inner.current = handle.committed_menu().await;
        outcome.map(Some)
    }

    /// Menu the host is believed to show right now
    pub async fn current_menu(&self) -> Vec<MenuNode> {
        let inner = self.inner.lock().await;
        match &inner.in_flight {
            Some(in_flight) => in_flight.handle.committed_menu().await,
            None => inner.current.clone(),
        }
    }

    /// Node currently bound to `id`, for routing a host selection event
    pub async fn resolve_selection(&self, id: RemoteId) -> Option<MenuNode> {
        let menu = self.current_menu().await;
        find_by_remote_id(&menu, id).cloned()
    }

    /// Cancel any running operation and refuse further updates
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        if let Some(in_flight) = inner.in_flight.take() {
            in_flight.handle.cancel().await;
            inner.current = Self::stop(in_flight).await;
        }
        info!("Menu manager shut down");
    }

    /// Wait for a canceled or finished operation and return its committed menu
    async fn stop(in_flight: InFlight) -> Vec<MenuNode> {
        let id = in_flight.handle.id();
        match in_flight.task.await {
            Ok(Ok(outcome)) => {
                debug!("Operation {} stopped, canceled: {}", id, outcome.is_canceled())
            }
            Ok(Err(e)) => warn!("Operation {} failed: {}", id, e),
            Err(e) => warn!("Operation {} task ended abnormally: {}", id, e),
        }
        in_flight.handle.committed_menu().await
    }
}

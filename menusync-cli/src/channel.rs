//! Offline stand-ins for the head unit

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use menusync_menu::{Artwork, RemoteCommand};
use menusync_proto::FunctionId;
use menusync_sync::{AssetUploader, RemoteChannel, Result, SyncError};
use serde::Serialize;
use tracing::{debug, info};

/// One encoded request as it would go on the wire
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    pub function: FunctionId,
    pub correlation_id: u32,
    pub target_id: u32,
    pub bytes: usize,
}

/// Encodes every command into a request frame and accepts it
#[derive(Default)]
pub struct DryRunChannel {
    fail_adds: bool,
    next_correlation_id: AtomicU32,
    batches: Mutex<Vec<Vec<RemoteCommand>>>,
    frames: Mutex<Vec<FrameRecord>>,
}

impl DryRunChannel {
    pub fn new(fail_adds: bool) -> Self {
        Self {
            fail_adds,
            ..Default::default()
        }
    }

    pub fn batches(&self) -> Vec<Vec<RemoteCommand>> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn frames(&self) -> Vec<FrameRecord> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RemoteChannel for DryRunChannel {
    async fn send_batch(&self, commands: &[RemoteCommand]) -> Result<()> {
        let mut records = Vec::with_capacity(commands.len());
        for command in commands {
            let correlation_id = self.next_correlation_id.fetch_add(1, Ordering::Relaxed);
            let bytes = command.to_frame(correlation_id)?.assemble()?;
            debug!(
                "-> {:?} #{} for {} ({} bytes)",
                command.function(),
                correlation_id,
                command.target_id(),
                bytes.len()
            );
            records.push(FrameRecord {
                function: command.function(),
                correlation_id,
                target_id: command.target_id().0,
                bytes: bytes.len(),
            });
        }

        if let Ok(mut batches) = self.batches.lock() {
            batches.push(commands.to_vec());
        }
        if let Ok(mut frames) = self.frames.lock() {
            frames.extend(records);
        }

        if self.fail_adds && commands.iter().any(RemoteCommand::is_add) {
            return Err(SyncError::Transport("host rejected add batch".to_string()));
        }
        Ok(())
    }
}

/// Pretends every artwork upload succeeds
#[derive(Default)]
pub struct DryRunUploader;

#[async_trait]
impl AssetUploader for DryRunUploader {
    fn is_uploaded(&self, _artwork: &Artwork) -> bool {
        false
    }

    async fn upload_artworks(&self, artworks: &[Artwork]) -> HashMap<String, String> {
        for artwork in artworks {
            info!("Would upload artwork {}", artwork.name);
        }
        HashMap::new()
    }
}

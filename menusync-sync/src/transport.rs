//! Seams to the RPC transport and the artwork upload layer

use std::collections::HashMap;

use async_trait::async_trait;
use menusync_menu::{Artwork, RemoteCommand};

use crate::errors::Result;

/// Request/response channel to the head unit
///
/// Implementations must eventually resolve every call; the engine awaits one
/// batch at a time and never overlaps batches of one operation.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Send an ordered batch; `Err` when any command in it failed
    async fn send_batch(&self, commands: &[RemoteCommand]) -> Result<()>;
}

/// Artwork storage on the head unit
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Whether the host already holds this artwork
    fn is_uploaded(&self, artwork: &Artwork) -> bool;

    /// Upload a batch; returns errors keyed by artwork name
    async fn upload_artworks(&self, artworks: &[Artwork]) -> HashMap<String, String>;
}

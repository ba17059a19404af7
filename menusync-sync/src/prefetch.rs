//! Artwork prefetch ahead of structural commands

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use menusync_menu::{walk, Artwork, MenuNode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::transport::AssetUploader;

/// Outcome of one prefetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchReport {
    /// Names of artworks sent for upload
    pub requested: Vec<String>,
    /// Upload errors keyed by artwork name
    pub failed: HashMap<String, String>,
}

impl PrefetchReport {
    pub fn uploaded_count(&self) -> usize {
        self.requested
            .iter()
            .filter(|name| !self.failed.contains_key(*name))
            .count()
    }
}

/// Uploads every artwork a menu references before the menu is sent
pub struct AssetPrefetcher {
    uploader: Arc<dyn AssetUploader>,
}

impl AssetPrefetcher {
    pub fn new(uploader: Arc<dyn AssetUploader>) -> Self {
        Self { uploader }
    }

    /// Distinct artworks anywhere in `menu` that the host does not have yet
    ///
    /// Static icons are skipped. Artworks are deduplicated by name, first
    /// occurrence wins.
    pub fn pending_artworks(&self, menu: &[MenuNode]) -> Vec<Artwork> {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        walk(menu, &mut |node| {
            for artwork in [node.icon.as_ref(), node.secondary_icon.as_ref()]
                .into_iter()
                .flatten()
            {
                if artwork.is_static() || !seen.insert(artwork.name.clone()) {
                    continue;
                }
                if !self.uploader.is_uploaded(artwork) {
                    pending.push(artwork.clone());
                }
            }
        });
        pending
    }

    /// Upload pending artworks as one batch
    ///
    /// Failures are logged and reported, never returned as errors: a missing
    /// icon must not keep the menu from being sent.
    pub async fn prefetch(&self, menu: &[MenuNode]) -> PrefetchReport {
        let pending = self.pending_artworks(menu);
        if pending.is_empty() {
            debug!("No menu artworks to upload");
            return PrefetchReport::default();
        }

        let requested: Vec<String> = pending.iter().map(|a| a.name.clone()).collect();
        let failed = self.uploader.upload_artworks(&pending).await;

        if failed.is_empty() {
            info!("Uploaded {} menu artworks", requested.len());
        } else {
            for (name, error) in &failed {
                warn!("Failed to upload menu artwork {}: {}", name, error);
            }
        }

        PrefetchReport { requested, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeUploader {
        on_host: HashSet<String>,
        broken: HashSet<String>,
        batches: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl AssetUploader for FakeUploader {
        fn is_uploaded(&self, artwork: &Artwork) -> bool {
            self.on_host.contains(&artwork.name)
        }

        async fn upload_artworks(&self, artworks: &[Artwork]) -> HashMap<String, String> {
            self.batches
                .lock()
                .unwrap()
                .push(artworks.iter().map(|a| a.name.clone()).collect());
            artworks
                .iter()
                .filter(|a| self.broken.contains(&a.name))
                .map(|a| (a.name.clone(), "rejected".to_string()))
                .collect()
        }
    }

    fn menu() -> Vec<MenuNode> {
        vec![
            MenuNode::new("Home").with_icon(Artwork::file("home", "/icons/home.png")),
            MenuNode::new("Media")
                .with_icon(Artwork::static_icon("music"))
                .with_children(vec![
                    MenuNode::new("Radio")
                        .with_icon(Artwork::file("radio", "/icons/radio.png"))
                        .with_secondary_icon(Artwork::file("home", "/icons/home.png")),
                    MenuNode::new("Podcasts").with_icon(Artwork::file("pod", "/icons/pod.png")),
                ]),
        ]
    }

    #[test]
    fn test_pending_artworks_dedupes_and_skips() {
        let uploader = FakeUploader {
            on_host: HashSet::from(["pod".to_string()]),
            ..Default::default()
        };
        let prefetcher = AssetPrefetcher::new(Arc::new(uploader));

        let names: Vec<_> = prefetcher
            .pending_artworks(&menu())
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["home", "radio"]);
    }

    #[tokio::test]
    async fn test_prefetch_single_batch() {
        let uploader = Arc::new(FakeUploader::default());
        let prefetcher = AssetPrefetcher::new(uploader.clone());

        let report = prefetcher.prefetch(&menu()).await;

        assert_eq!(report.requested, vec!["home", "radio", "pod"]);
        assert!(report.failed.is_empty());
        assert_eq!(uploader.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prefetch_failures_are_reported() {
        let uploader = Arc::new(FakeUploader {
            broken: HashSet::from(["radio".to_string()]),
            ..Default::default()
        });
        let prefetcher = AssetPrefetcher::new(uploader);

        let report = prefetcher.prefetch(&menu()).await;

        assert_eq!(report.failed.len(), 1);
        assert!(report.failed.contains_key("radio"));
        assert_eq!(report.uploaded_count(), 2);
    }

    #[test]
    fn test_uploaded_count_ignores_unrequested_failures() {
        let report = PrefetchReport {
            requested: vec!["home".to_string()],
            failed: HashMap::from([
                ("radio".to_string(), "unknown".to_string()),
                ("pod".to_string(), "unknown".to_string()),
            ]),
        };

        assert_eq!(report.uploaded_count(), 1);
    }

    #[tokio::test]
    async fn test_nothing_to_upload() {
        let uploader = Arc::new(FakeUploader::default());
        let prefetcher = AssetPrefetcher::new(uploader.clone());

        let report = prefetcher
            .prefetch(&[MenuNode::new("Plain").with_icon(Artwork::static_icon("star"))])
            .await;

        assert!(report.requested.is_empty());
        assert!(uploader.batches.lock().unwrap().is_empty());
    }
}

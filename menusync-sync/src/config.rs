//! Configuration for menu reconciliation

use menusync_menu::MenuLayout;
use serde::{Deserialize, Serialize};

/// Reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Number duplicate sibling titles ("Text (2)") for hosts that reject
    /// identical labels
    pub disambiguate_titles: bool,

    /// Upload referenced artworks before sending structural commands
    pub prefetch_artworks: bool,

    /// Layout used for submenus that carry no layout hint
    pub default_submenu_layout: MenuLayout,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            disambiguate_titles: false,
            prefetch_artworks: true,
            default_submenu_layout: MenuLayout::List,
        }
    }
}

impl SyncConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disambiguate_titles(mut self, enabled: bool) -> Self {
        self.disambiguate_titles = enabled;
        self
    }

    pub fn prefetch_artworks(mut self, enabled: bool) -> Self {
        self.prefetch_artworks = enabled;
        self
    }

    pub fn default_submenu_layout(mut self, layout: MenuLayout) -> Self {
        self.default_submenu_layout = layout;
        self
    }
}

//! Menu nodes and content keys

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ids::RemoteId;

/// How the host lays out the entries of a submenu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuLayout {
    #[default]
    List,
    Tiles,
}

/// Where an artwork's bytes come from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkSource {
    /// Icon built into the head unit, referenced by name
    Static(String),
    /// File uploaded by the application before use
    File(PathBuf),
}

/// Image referenced by a menu node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artwork {
    /// Name the host stores the image under
    pub name: String,
    pub source: ArtworkSource,
    #[serde(default)]
    pub is_template: bool,
}

impl Artwork {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: ArtworkSource::File(path.into()),
            is_template: false,
        }
    }

    pub fn static_icon(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: ArtworkSource::Static(name.clone()),
            name,
            is_template: false,
        }
    }

    /// Static icons live on the host and never need uploading
    pub fn is_static(&self) -> bool {
        matches!(self.source, ArtworkSource::Static(_))
    }
}

/// Digest of the fields that make two nodes interchangeable
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey([u8; 32]);

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", &hex::encode(self.0)[..12])
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// One entry of the menu tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNode {
    /// Primary text
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tertiary_text: Option<String>,
    /// Voice phrases that trigger this entry, order-sensitive
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub voice_commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Artwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_icon: Option<Artwork>,
    /// Layout hint used when this node is a submenu
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submenu_layout: Option<MenuLayout>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
    /// Submenu on the host whose children are all gone or not yet sent
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub empty_submenu: bool,
    /// Suffix that makes duplicate sibling titles unique on screen
    #[serde(default = "default_disambiguator")]
    pub disambiguator: u32,
    #[serde(default)]
    pub remote_id: RemoteId,
}

fn default_disambiguator() -> u32 {
    1
}

impl MenuNode {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            secondary_text: None,
            tertiary_text: None,
            voice_commands: Vec::new(),
            icon: None,
            secondary_icon: None,
            submenu_layout: None,
            children: Vec::new(),
            empty_submenu: false,
            disambiguator: 1,
            remote_id: RemoteId::UNSET,
        }
    }

    pub fn with_secondary_text(mut self, text: impl Into<String>) -> Self {
        self.secondary_text = Some(text.into());
        self
    }

    pub fn with_tertiary_text(mut self, text: impl Into<String>) -> Self {
        self.tertiary_text = Some(text.into());
        self
    }

    pub fn with_voice_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.voice_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_icon(mut self, icon: Artwork) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_secondary_icon(mut self, icon: Artwork) -> Self {
        self.secondary_icon = Some(icon);
        self
    }

    pub fn with_layout(mut self, layout: MenuLayout) -> Self {
        self.submenu_layout = Some(layout);
        self
    }

    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_remote_id(mut self, id: RemoteId) -> Self {
        self.remote_id = id;
        self
    }

    pub fn is_submenu(&self) -> bool {
        self.empty_submenu || !self.children.is_empty()
    }

    /// Replace the children without changing whether this is a submenu
    pub fn set_children(&mut self, children: Vec<MenuNode>) {
        let submenu = self.is_submenu();
        self.children = children;
        self.empty_submenu = submenu && self.children.is_empty();
    }

    /// Label shown by the host, including the disambiguation suffix
    pub fn display_title(&self) -> String {
        if self.disambiguator != 1 {
            format!("{} ({})", self.title, self.disambiguator)
        } else {
            self.title.clone()
        }
    }

    /// Compute the content key
    ///
    /// Covers the display and voice fields plus whether the node is a
    /// submenu. Children, the remote id and the disambiguator never
    /// participate.
    pub fn content_key(&self) -> ContentKey {
        let mut hasher = blake3::Hasher::new();
        hash_str(&mut hasher, &self.title);
        hash_opt_str(&mut hasher, self.secondary_text.as_deref());
        hash_opt_str(&mut hasher, self.tertiary_text.as_deref());

        hasher.update(&(self.voice_commands.len() as u64).to_le_bytes());
        for phrase in &self.voice_commands {
            hash_str(&mut hasher, phrase);
        }

        hash_artwork(&mut hasher, self.icon.as_ref());
        hash_artwork(&mut hasher, self.secondary_icon.as_ref());

        let layout_tag: u8 = match self.submenu_layout {
            None => 0,
            Some(MenuLayout::List) => 1,
            Some(MenuLayout::Tiles) => 2,
        };
        hasher.update(&[layout_tag, self.is_submenu() as u8]);

        ContentKey(*hasher.finalize().as_bytes())
    }
}

fn hash_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_opt_str(hasher: &mut blake3::Hasher, value: Option<&str>) {
    match value {
        Some(value) => {
            hasher.update(&[1]);
            hash_str(hasher, value);
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

fn hash_artwork(hasher: &mut blake3::Hasher, artwork: Option<&Artwork>) {
    match artwork {
        Some(artwork) => {
            hasher.update(&[1, artwork.is_static() as u8, artwork.is_template as u8]);
            hash_str(hasher, &artwork.name);
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_key_ignores_identity_fields() {
        let a = MenuNode::new("Settings").with_remote_id(RemoteId(4));
        let mut b = MenuNode::new("Settings").with_remote_id(RemoteId(99));
        b.disambiguator = 3;

        assert_eq!(a.content_key(), b.content_key());
    }

    #[test]
    fn test_content_key_ignores_child_contents() {
        let a = MenuNode::new("Media").with_children(vec![MenuNode::new("Radio")]);
        let b = MenuNode::new("Media").with_children(vec![
            MenuNode::new("Podcasts"),
            MenuNode::new("Bluetooth"),
        ]);

        assert_eq!(a.content_key(), b.content_key());
    }

    #[test]
    fn test_content_key_distinguishes_leaf_from_submenu() {
        let leaf = MenuNode::new("Media");
        let submenu = MenuNode::new("Media").with_children(vec![MenuNode::new("Radio")]);

        assert_ne!(leaf.content_key(), submenu.content_key());
    }

    #[test]
    fn test_emptied_submenu_stays_a_submenu() {
        let target = MenuNode::new("Media").with_children(vec![MenuNode::new("Radio")]);
        let mut emptied = target.clone();
        emptied.set_children(Vec::new());

        assert!(emptied.is_submenu());
        assert_eq!(emptied.content_key(), target.content_key());

        emptied.set_children(vec![MenuNode::new("Podcasts")]);
        assert!(!emptied.empty_submenu);

        let mut leaf = MenuNode::new("Home");
        leaf.set_children(Vec::new());
        assert!(!leaf.is_submenu());
    }

    #[test]
    fn test_voice_command_order_matters() {
        let a = MenuNode::new("Call").with_voice_commands(["call", "dial"]);
        let b = MenuNode::new("Call").with_voice_commands(["dial", "call"]);

        assert_ne!(a.content_key(), b.content_key());
    }

    #[test]
    fn test_field_boundaries_do_not_collide() {
        let a = MenuNode::new("ab").with_secondary_text("c");
        let b = MenuNode::new("a").with_secondary_text("bc");

        assert_ne!(a.content_key(), b.content_key());
    }

    #[test]
    fn test_artwork_participates() {
        let plain = MenuNode::new("Home");
        let with_icon = MenuNode::new("Home").with_icon(Artwork::file("home", "/tmp/home.png"));
        let with_static = MenuNode::new("Home").with_icon(Artwork::static_icon("home"));

        assert_ne!(plain.content_key(), with_icon.content_key());
        assert_ne!(with_icon.content_key(), with_static.content_key());
    }

    #[test]
    fn test_display_title() {
        let mut node = MenuNode::new("Text");
        assert_eq!(node.display_title(), "Text");

        node.disambiguator = 2;
        assert_eq!(node.display_title(), "Text (2)");
    }

    #[test]
    fn test_json_defaults() {
        let node: MenuNode = serde_json::from_str(r#"{"title": "Help"}"#).unwrap();
        assert_eq!(node.disambiguator, 1);
        assert!(!node.remote_id.is_set());
        assert!(node.children.is_empty());
    }
}

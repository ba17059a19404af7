//! Traversal helpers over menu trees

use std::collections::HashMap;

use crate::ids::RemoteId;
use crate::node::MenuNode;

/// Visit every node depth-first, parents before children
pub fn walk<'a>(nodes: &'a [MenuNode], visit: &mut impl FnMut(&'a MenuNode)) {
    for node in nodes {
        visit(node);
        walk(&node.children, visit);
    }
}

/// Find the node currently holding `id`, at any depth
pub fn find_by_remote_id(nodes: &[MenuNode], id: RemoteId) -> Option<&MenuNode> {
    if !id.is_set() {
        return None;
    }
    for node in nodes {
        if node.remote_id == id {
            return Some(node);
        }
        if let Some(found) = find_by_remote_id(&node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Resolve the sibling list reached by following `path` (ancestor ids, root
/// first) down from `root`
pub fn level_mut<'a>(
    root: &'a mut Vec<MenuNode>,
    path: &[RemoteId],
) -> Option<&'a mut Vec<MenuNode>> {
    match path.split_first() {
        None => Some(root),
        Some((id, rest)) => {
            let node = root.iter_mut().find(|n| n.remote_id == *id)?;
            level_mut(&mut node.children, rest)
        }
    }
}

/// Replace the sibling list at `path`
///
/// The parent keeps its submenu kind even when `level` is empty. Returns
/// false when `path` does not resolve.
pub fn replace_level(root: &mut Vec<MenuNode>, path: &[RemoteId], level: Vec<MenuNode>) -> bool {
    let Some((id, ancestors)) = path.split_last() else {
        *root = level;
        return true;
    };

    let parent = level_mut(root, ancestors)
        .and_then(|siblings| siblings.iter_mut().find(|n| n.remote_id == *id));
    match parent {
        Some(parent) => {
            parent.set_children(level);
            true
        }
        None => false,
    }
}

/// Number siblings that share a title so the host shows unique labels
///
/// The first occurrence keeps 1, later ones get 2, 3, ... Applied at every
/// level.
pub fn assign_disambiguators(nodes: &mut [MenuNode]) {
    let mut seen: HashMap<String, u32> = HashMap::new();
    for node in nodes.iter_mut() {
        let count = seen.entry(node.title.clone()).or_insert(0);
        *count += 1;
        node.disambiguator = *count;
        assign_disambiguators(&mut node.children);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<MenuNode> {
        vec![
            MenuNode::new("Home").with_remote_id(RemoteId(1)),
            MenuNode::new("Media")
                .with_remote_id(RemoteId(2))
                .with_children(vec![
                    MenuNode::new("Radio").with_remote_id(RemoteId(3)),
                    MenuNode::new("Podcasts")
                        .with_remote_id(RemoteId(4))
                        .with_children(vec![MenuNode::new("Latest").with_remote_id(RemoteId(5))]),
                ]),
        ]
    }

    #[test]
    fn test_walk_order() {
        let menu = sample();
        let mut titles = Vec::new();
        walk(&menu, &mut |node| titles.push(node.title.as_str()));
        assert_eq!(titles, vec!["Home", "Media", "Radio", "Podcasts", "Latest"]);
    }

    #[test]
    fn test_find_by_remote_id() {
        let menu = sample();
        assert_eq!(find_by_remote_id(&menu, RemoteId(5)).unwrap().title, "Latest");
        assert!(find_by_remote_id(&menu, RemoteId(42)).is_none());
        assert!(find_by_remote_id(&menu, RemoteId::UNSET).is_none());
    }

    #[test]
    fn test_level_mut() {
        let mut menu = sample();
        let level = level_mut(&mut menu, &[RemoteId(2), RemoteId(4)]).unwrap();
        assert_eq!(level.len(), 1);
        level.push(MenuNode::new("Oldest"));

        assert_eq!(menu[1].children[1].children.len(), 2);
        assert!(level_mut(&mut menu, &[RemoteId(9)]).is_none());
    }

    #[test]
    fn test_replace_level() {
        let mut menu = sample();

        assert!(replace_level(&mut menu, &[RemoteId(2), RemoteId(4)], Vec::new()));
        let podcasts = &menu[1].children[1];
        assert!(podcasts.children.is_empty());
        assert!(podcasts.is_submenu());

        assert!(replace_level(&mut menu, &[], vec![MenuNode::new("Only")]));
        assert_eq!(menu.len(), 1);
        assert!(!replace_level(&mut menu, &[RemoteId(2)], Vec::new()));
    }

    #[test]
    fn test_assign_disambiguators() {
        let mut menu = vec![
            MenuNode::new("Text"),
            MenuNode::new("Other"),
            MenuNode::new("Text"),
            MenuNode::new("Text").with_children(vec![MenuNode::new("Text"), MenuNode::new("Text")]),
        ];

        assign_disambiguators(&mut menu);

        let labels: Vec<_> = menu.iter().map(MenuNode::display_title).collect();
        assert_eq!(labels, vec!["Text", "Other", "Text (2)", "Text (3)"]);
        assert_eq!(menu[3].children[0].disambiguator, 1);
        assert_eq!(menu[3].children[1].disambiguator, 2);
    }
}

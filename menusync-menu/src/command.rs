//! Remote structural commands derived from menu nodes

use serde::{Deserialize, Serialize};

use menusync_proto::{Frame, FunctionId};

use crate::ids::RemoteId;
use crate::node::{MenuLayout, MenuNode};

/// A structural change sent to the head unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RemoteCommand {
    AddCommand {
        cmd_id: RemoteId,
        /// None for the top-level menu
        parent_id: Option<RemoteId>,
        position: u32,
        menu_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secondary_text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tertiary_text: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        vr_commands: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secondary_icon: Option<String>,
    },
    AddSubMenu {
        menu_id: RemoteId,
        parent_id: Option<RemoteId>,
        position: u32,
        menu_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secondary_text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tertiary_text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secondary_icon: Option<String>,
        layout: MenuLayout,
    },
    DeleteCommand {
        cmd_id: RemoteId,
    },
    DeleteSubMenu {
        menu_id: RemoteId,
    },
}

impl RemoteCommand {
    /// Host function this command invokes
    pub fn function(&self) -> FunctionId {
        match self {
            RemoteCommand::AddCommand { .. } => FunctionId::AddCommand,
            RemoteCommand::AddSubMenu { .. } => FunctionId::AddSubMenu,
            RemoteCommand::DeleteCommand { .. } => FunctionId::DeleteCommand,
            RemoteCommand::DeleteSubMenu { .. } => FunctionId::DeleteSubMenu,
        }
    }

    /// Id of the entry this command creates or deletes
    pub fn target_id(&self) -> RemoteId {
        match self {
            RemoteCommand::AddCommand { cmd_id, .. } | RemoteCommand::DeleteCommand { cmd_id } => {
                *cmd_id
            }
            RemoteCommand::AddSubMenu { menu_id, .. }
            | RemoteCommand::DeleteSubMenu { menu_id } => *menu_id,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(
            self,
            RemoteCommand::AddCommand { .. } | RemoteCommand::AddSubMenu { .. }
        )
    }

    /// Encode as a request frame with a JSON payload
    pub fn to_frame(&self, correlation_id: u32) -> menusync_proto::Result<Frame> {
        Frame::request(self.function(), correlation_id, self)
    }
}

fn add_for_node(
    node: &MenuNode,
    parent_id: Option<RemoteId>,
    position: usize,
    default_layout: MenuLayout,
) -> RemoteCommand {
    let icon = node.icon.as_ref().map(|a| a.name.clone());
    let secondary_icon = node.secondary_icon.as_ref().map(|a| a.name.clone());

    if node.is_submenu() {
        RemoteCommand::AddSubMenu {
            menu_id: node.remote_id,
            parent_id,
            position: position as u32,
            menu_name: node.display_title(),
            secondary_text: node.secondary_text.clone(),
            tertiary_text: node.tertiary_text.clone(),
            icon,
            secondary_icon,
            layout: node.submenu_layout.unwrap_or(default_layout),
        }
    } else {
        RemoteCommand::AddCommand {
            cmd_id: node.remote_id,
            parent_id,
            position: position as u32,
            menu_name: node.display_title(),
            secondary_text: node.secondary_text.clone(),
            tertiary_text: node.tertiary_text.clone(),
            vr_commands: node.voice_commands.clone(),
            icon,
            secondary_icon,
        }
    }
}

/// Delete commands for `nodes`; deleting a submenu drops its children on
/// the host as well
pub fn delete_commands<'a>(nodes: impl IntoIterator<Item = &'a MenuNode>) -> Vec<RemoteCommand> {
    nodes
        .into_iter()
        .map(|node| {
            if node.is_submenu() {
                RemoteCommand::DeleteSubMenu {
                    menu_id: node.remote_id,
                }
            } else {
                RemoteCommand::DeleteCommand {
                    cmd_id: node.remote_id,
                }
            }
        })
        .collect()
}

/// Commands creating the nodes at `added` indices of `level` under `parent_id`
///
/// Positions are the nodes' indices in the target sibling list.
pub fn add_commands(
    level: &[MenuNode],
    added: &[usize],
    parent_id: Option<RemoteId>,
    default_layout: MenuLayout,
) -> Vec<RemoteCommand> {
    added
        .iter()
        .filter_map(|&index| level.get(index).map(|node| (index, node)))
        .map(|(index, node)| add_for_node(node, parent_id, index, default_layout))
        .collect()
}

/// Commands creating every descendant of the added nodes, parents first
pub fn submenu_commands(
    level: &[MenuNode],
    added: &[usize],
    default_layout: MenuLayout,
) -> Vec<RemoteCommand> {
    let mut commands = Vec::new();
    for node in added.iter().filter_map(|&index| level.get(index)) {
        push_descendants(node, default_layout, &mut commands);
    }
    commands
}

fn push_descendants(parent: &MenuNode, default_layout: MenuLayout, out: &mut Vec<RemoteCommand>) {
    for (position, child) in parent.children.iter().enumerate() {
        out.push(add_for_node(child, Some(parent.remote_id), position, default_layout));
        push_descendants(child, default_layout, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Artwork;

    fn level() -> Vec<MenuNode> {
        vec![
            MenuNode::new("Home").with_remote_id(RemoteId(1)),
            MenuNode::new("Media")
                .with_remote_id(RemoteId(2))
                .with_icon(Artwork::static_icon("music"))
                .with_children(vec![
                    MenuNode::new("Radio").with_remote_id(RemoteId(3)),
                    MenuNode::new("Podcasts")
                        .with_remote_id(RemoteId(4))
                        .with_layout(MenuLayout::Tiles)
                        .with_children(vec![MenuNode::new("Latest").with_remote_id(RemoteId(5))]),
                ]),
        ]
    }

    #[test]
    fn test_delete_commands_by_kind() {
        let level = level();
        let commands = delete_commands(&level);
        assert_eq!(
            commands,
            vec![
                RemoteCommand::DeleteCommand { cmd_id: RemoteId(1) },
                RemoteCommand::DeleteSubMenu { menu_id: RemoteId(2) },
            ]
        );
    }

    #[test]
    fn test_add_commands_use_target_positions() {
        let level = level();
        let commands = add_commands(&level, &[1], None, MenuLayout::List);

        assert_eq!(commands.len(), 1);
        match &commands[0] {
            RemoteCommand::AddSubMenu {
                menu_id,
                parent_id,
                position,
                icon,
                layout,
                ..
            } => {
                assert_eq!(*menu_id, RemoteId(2));
                assert_eq!(*parent_id, None);
                assert_eq!(*position, 1);
                assert_eq!(icon.as_deref(), Some("music"));
                assert_eq!(*layout, MenuLayout::List);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_submenu_commands_parents_first() {
        let level = level();
        let commands = submenu_commands(&level, &[0, 1], MenuLayout::List);

        let targets: Vec<_> = commands.iter().map(RemoteCommand::target_id).collect();
        assert_eq!(targets, vec![RemoteId(3), RemoteId(4), RemoteId(5)]);

        match &commands[1] {
            RemoteCommand::AddSubMenu { parent_id, layout, .. } => {
                assert_eq!(*parent_id, Some(RemoteId(2)));
                assert_eq!(*layout, MenuLayout::Tiles);
            }
            other => panic!("unexpected command {:?}", other),
        }
        match &commands[2] {
            RemoteCommand::AddCommand { parent_id, position, .. } => {
                assert_eq!(*parent_id, Some(RemoteId(4)));
                assert_eq!(*position, 0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_disambiguated_label_is_sent() {
        let mut node = MenuNode::new("Text").with_remote_id(RemoteId(7));
        node.disambiguator = 2;

        let commands = add_commands(&[node], &[0], None, MenuLayout::List);
        match &commands[0] {
            RemoteCommand::AddCommand { menu_name, .. } => assert_eq!(menu_name, "Text (2)"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_to_frame() {
        let command = RemoteCommand::DeleteSubMenu { menu_id: RemoteId(2) };
        let frame = command.to_frame(11).unwrap();

        assert_eq!(frame.header().function(), FunctionId::DeleteSubMenu);
        assert_eq!(frame.header().correlation_id, 11);
        let decoded: RemoteCommand = frame.decode_payload().unwrap();
        assert_eq!(decoded, command);
    }
}

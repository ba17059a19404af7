//! Frame type tags and host function identifiers

use serde::{Deserialize, Serialize};

/// Frame type carried in the high byte of the first header word
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    Request = 0,
    Response = 1,
    Notification = 2,
}

impl FrameType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FrameType::Request),
            1 => Some(FrameType::Response),
            2 => Some(FrameType::Notification),
            _ => None,
        }
    }
}

/// Host function identifiers used by the menu engine
///
/// The header reserves 24 bits for the function id; anything else the host
/// sends is carried through as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionId {
    AddCommand,
    DeleteCommand,
    AddSubMenu,
    DeleteSubMenu,
    PutFile,
    OnCommand,
    Other(u32),
}

impl FunctionId {
    pub fn value(self) -> u32 {
        match self {
            FunctionId::AddCommand => 5,
            FunctionId::DeleteCommand => 6,
            FunctionId::AddSubMenu => 7,
            FunctionId::DeleteSubMenu => 8,
            FunctionId::PutFile => 32,
            FunctionId::OnCommand => 32782,
            FunctionId::Other(value) => value,
        }
    }

    pub fn from_value(value: u32) -> Self {
        match value {
            5 => FunctionId::AddCommand,
            6 => FunctionId::DeleteCommand,
            7 => FunctionId::AddSubMenu,
            8 => FunctionId::DeleteSubMenu,
            32 => FunctionId::PutFile,
            32782 => FunctionId::OnCommand,
            other => FunctionId::Other(other),
        }
    }
}

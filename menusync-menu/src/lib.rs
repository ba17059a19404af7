//! Menu tree model for menusync
//!
//! This crate provides:
//! - `MenuNode`, the unit the reconciler compares and sends
//! - Content keys used to decide whether two nodes are interchangeable
//! - Remote identifiers and their allocation
//! - Construction of the remote add/delete commands for nodes

pub mod command;
pub mod ids;
pub mod node;
pub mod tree;

pub use command::RemoteCommand;
pub use ids::{assign_fresh_ids, IdAllocator, RemoteId};
pub use node::{Artwork, ArtworkSource, ContentKey, MenuLayout, MenuNode};
pub use tree::{assign_disambiguators, find_by_remote_id, level_mut, replace_level, walk};

//! Wire framing for the menusync RPC channel
//!
//! Every request, response and notification exchanged with the head unit is
//! framed by a fixed 12-byte header followed by a structured (JSON) payload
//! and optional opaque bulk data. This crate provides:
//! - Header assembly and parsing
//! - Frame type and function identifiers
//! - Size limits and validation

pub mod errors;
pub mod frame;
pub mod message;
pub mod validation;

pub use errors::{FrameError, Result};
pub use frame::{Frame, FrameHeader, HEADER_SIZE};
pub use message::{FrameType, FunctionId};
pub use validation::{limits, Validator};

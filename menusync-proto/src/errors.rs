//! Error types for frame encoding and decoding

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Frame truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Unknown frame type: {0:#04x}")]
    UnknownFrameType(u8),

    #[error("Declared payload size {declared} exceeds available {available} bytes")]
    PayloadOverrun { declared: usize, available: usize },

    #[error("Payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Function id {0:#x} does not fit in 24 bits")]
    FunctionIdOutOfRange(u32),

    #[error("JSON payload error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;

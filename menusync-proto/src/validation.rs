//! Size limits for frames exchanged with the head unit

use crate::errors::{FrameError, Result};

/// Maximum size limits for frame fields
pub mod limits {
    /// Largest structured payload accepted in one frame (8 MB)
    pub const MAX_PAYLOAD_SIZE: usize = 8 * 1024 * 1024;

    /// Function ids occupy the low 24 bits of the first header word
    pub const MAX_FUNCTION_ID: u32 = 0x00FF_FFFF;
}

/// Validator for frame fields
pub struct Validator;

impl Validator {
    /// Validate a declared structured payload size
    pub fn validate_payload_size(size: usize) -> Result<()> {
        if size > limits::MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: limits::MAX_PAYLOAD_SIZE,
            });
        }
        Ok(())
    }

    /// Validate that a function id fits in the header
    pub fn validate_function_id(function_id: u32) -> Result<()> {
        if function_id > limits::MAX_FUNCTION_ID {
            return Err(FrameError::FunctionIdOutOfRange(function_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_size_limit() {
        assert!(Validator::validate_payload_size(0).is_ok());
        assert!(Validator::validate_payload_size(limits::MAX_PAYLOAD_SIZE).is_ok());
        assert!(matches!(
            Validator::validate_payload_size(limits::MAX_PAYLOAD_SIZE + 1),
            Err(FrameError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_function_id_limit() {
        assert!(Validator::validate_function_id(0x00FF_FFFF).is_ok());
        assert!(matches!(
            Validator::validate_function_id(0x0100_0000),
            Err(FrameError::FunctionIdOutOfRange(_))
        ));
    }
}

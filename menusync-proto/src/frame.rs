//! Frame header assembly and parsing
//!
//! Layout of the 12-byte header (all words big-endian):
//!
//! ```text
//!  0        1        2        3
//! +--------+--------+--------+--------+
//! |  type  |      function id (24)    |
//! +--------+--------+--------+--------+
//! |          correlation id           |
//! +--------+--------+--------+--------+
//! |      structured payload size      |
//! +--------+--------+--------+--------+
//! ```
//!
//! The structured payload follows the header. Whatever comes after it is
//! opaque bulk data.

use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::errors::{FrameError, Result};
use crate::message::{FrameType, FunctionId};
use crate::validation::{limits, Validator};

/// Size of the fixed frame header in bytes
pub const HEADER_SIZE: usize = 12;

/// Parsed frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    pub function_id: u32,
    pub correlation_id: u32,
    pub payload_size: u32,
}

impl FrameHeader {
    /// Encode the header into its 12-byte wire form
    ///
    /// Function ids wider than 24 bits are truncated here; use
    /// [`Frame::assemble`] for checked encoding.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let word0 = ((self.frame_type as u32) << 24) | (self.function_id & limits::MAX_FUNCTION_ID);

        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&word0.to_be_bytes());
        out[4..8].copy_from_slice(&self.correlation_id.to_be_bytes());
        out[8..12].copy_from_slice(&self.payload_size.to_be_bytes());
        out
    }

    /// Decode a header from the first 12 bytes of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(FrameError::Truncated {
                needed: HEADER_SIZE,
                available: bytes.len(),
            });
        }

        let frame_type =
            FrameType::from_u8(bytes[0]).ok_or(FrameError::UnknownFrameType(bytes[0]))?;
        let word0 = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let correlation_id = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let payload_size = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);

        Ok(Self {
            frame_type,
            function_id: word0 & limits::MAX_FUNCTION_ID,
            correlation_id,
            payload_size,
        })
    }

    pub fn function(&self) -> FunctionId {
        FunctionId::from_value(self.function_id)
    }
}

/// A complete frame: header, structured payload and optional bulk data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    payload: Bytes,
    bulk: Option<Bytes>,
}

impl Frame {
    /// Create a frame; the header's payload size is derived from `payload`
    pub fn new(
        frame_type: FrameType,
        function: FunctionId,
        correlation_id: u32,
        payload: Bytes,
        bulk: Option<Bytes>,
    ) -> Self {
        let header = FrameHeader {
            frame_type,
            function_id: function.value(),
            correlation_id,
            payload_size: payload.len() as u32,
        };
        Self {
            header,
            payload,
            bulk: bulk.filter(|b| !b.is_empty()),
        }
    }

    /// Create a request frame with a JSON payload
    pub fn request<T: Serialize>(
        function: FunctionId,
        correlation_id: u32,
        body: &T,
    ) -> Result<Self> {
        let payload = serde_json::to_vec(body)?;
        Validator::validate_payload_size(payload.len())?;
        Ok(Self::new(
            FrameType::Request,
            function,
            correlation_id,
            Bytes::from(payload),
            None,
        ))
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn bulk(&self) -> Option<&Bytes> {
        self.bulk.as_ref()
    }

    /// Deserialize the structured payload
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Total encoded length of this frame
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len() + self.bulk.as_ref().map_or(0, |b| b.len())
    }

    /// Assemble the frame into wire bytes
    pub fn assemble(&self) -> Result<Bytes> {
        Validator::validate_function_id(self.header.function_id)?;
        Validator::validate_payload_size(self.payload.len())?;

        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_slice(&self.header.encode());
        buf.put_slice(&self.payload);
        if let Some(bulk) = &self.bulk {
            buf.put_slice(bulk);
        }
        Ok(buf.freeze())
    }

    /// Parse a frame from wire bytes
    ///
    /// Rejects frames whose declared payload size cannot be satisfied by the
    /// bytes that follow the header.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::decode(bytes)?;
        let declared = header.payload_size as usize;
        let available = bytes.len() - HEADER_SIZE;

        if declared > available {
            return Err(FrameError::PayloadOverrun {
                declared,
                available,
            });
        }
        Validator::validate_payload_size(declared)?;

        let body = &bytes[HEADER_SIZE..];
        let payload = Bytes::copy_from_slice(&body[..declared]);
        let rest = &body[declared..];
        let bulk = (!rest.is_empty()).then(|| Bytes::copy_from_slice(rest));

        trace!(
            "Parsed {:?} frame: function={} correlation={} payload={} bulk={}",
            header.frame_type,
            header.function_id,
            header.correlation_id,
            declared,
            rest.len()
        );

        Ok(Self {
            header,
            payload,
            bulk,
        })
    }
}

//! Wire envelope.
//!
//! One JSON object per stream, no chunking:
//!
//! ```text
//! {"type": "signature", "sender": "<peer id>", "timestamp": <unix secs>, "data": "<hex>"}
//! ```
//!
//! For `type = "signature"` the hex payload is the JSON of a
//! [`SignatureMessage`](relay_types::SignatureMessage).

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::error::{GossipError, GossipResult};

/// Largest frame accepted by the single bounded read.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Envelope type carrying a partial signature.
pub const SIGNATURE_TYPE: &str = "signature";

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub message_type: String,
    pub sender: String,
    /// Sender's unix time in seconds
    pub timestamp: i64,
    #[serde_as(as = "Hex")]
    pub data: Vec<u8>,
}

impl Envelope {
    pub fn new(message_type: &str, sender: &str, timestamp: i64, data: Vec<u8>) -> Self {
        Self {
            message_type: message_type.to_string(),
            sender: sender.to_string(),
            timestamp,
            data,
        }
    }

    /// Serialize into a frame, refusing anything a peer would drop.
    pub fn encode(&self) -> GossipResult<Vec<u8>> {
        let frame = serde_json::to_vec(self).map_err(|e| GossipError::Malformed(e.to_string()))?;
        if frame.len() > MAX_FRAME_SIZE {
            return Err(GossipError::FrameTooLarge {
                size: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        Ok(frame)
    }

    pub fn decode(frame: &[u8]) -> GossipResult<Self> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(GossipError::FrameTooLarge {
                size: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        serde_json::from_slice(frame).map_err(|e| GossipError::Malformed(e.to_string()))
    }
}

//! Observer message types.

use crate::error::WsResult;
use serde::{Deserialize, Serialize};

/// Subscription topic requesting the next new block.
pub const NEW_BLOCK_TOPIC: &str = "new_block";

/// Request sent to the observer each poll cycle.
///
/// Wire format: `{"subscribe":"new_block","chain_id":"columbus-4"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub subscribe: String,
    pub chain_id: String,
}

impl SubscribeRequest {
    /// Request the next new block of `chain_id`.
    pub fn new_block(chain_id: impl Into<String>) -> Self {
        Self {
            subscribe: NEW_BLOCK_TOPIC.to_string(),
            chain_id: chain_id.into(),
        }
    }

    /// Serialize once; the same text is re-sent unchanged every cycle.
    pub fn encode(&self) -> WsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

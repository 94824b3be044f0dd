//! Block payload parsing.

use crate::error::{FeedError, FeedResult};
use monitor_core::Block;

/// Decode a raw observer payload into a [`Block`].
///
/// Missing fields decode to their empty value; only payloads that are not
/// JSON, or whose structure contradicts the block shape, are rejected.
pub fn parse_block(payload: &[u8]) -> FeedResult<Block> {
    serde_json::from_slice(payload).map_err(|e| FeedError::Decode(format!("invalid JSON: {e}")))
}

//! Observer block payload.
//!
//! Every container is `#[serde(default)]`: fields the observer omits decode to
//! their empty value instead of failing the whole block.

use serde::{Deserialize, Serialize};

/// A block as pushed by the observer feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    /// Chain identifier (e.g., "columbus-4").
    pub chain_id: String,
    /// Block type tag (e.g., "new_block").
    #[serde(rename = "type")]
    pub block_type: String,
    /// Transactions and supply.
    pub data: BlockData,
}

/// Block payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockData {
    pub txs: Vec<Tx>,
    pub supply: Vec<SupplyEntry>,
}

/// A transaction with its execution logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tx {
    /// Block height as reported by the observer (decimal string).
    pub height: String,
    pub logs: Vec<Log>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Log {
    pub events: Vec<Event>,
}

/// A typed event with ordered key/value attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// Total supply of one denomination, amount as a decimal string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyEntry {
    pub denom: String,
    pub amount: String,
}

impl Block {
    /// Find the value of the first attribute `key` inside the first event of
    /// type `event_type`.
    ///
    /// Walks txs → logs → events in document order. The first event with a
    /// matching type that also carries `key` ends the search, even if later
    /// events would match too.
    pub fn find_event_attribute(&self, event_type: &str, key: &str) -> Option<&str> {
        self.data
            .txs
            .iter()
            .flat_map(|tx| tx.logs.iter())
            .flat_map(|log| log.events.iter())
            .filter(|ev| ev.event_type == event_type)
            .find_map(|ev| {
                ev.attributes
                    .iter()
                    .find(|attr| attr.key == key)
                    .map(|attr| attr.value.as_str())
            })
    }

    /// Height of the first transaction, if the block carries any.
    pub fn height(&self) -> Option<&str> {
        self.data
            .txs
            .first()
            .map(|tx| tx.height.as_str())
            .filter(|h| !h.is_empty())
    }
}

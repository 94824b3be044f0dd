//! Core domain types for the oracle price monitor.
//!
//! This crate provides the types shared by the feed, gateway and server crates:
//! - `Block`: observer block payload (txs → logs → events → attributes, supply)
//! - `RateTable`, `SupplyTable`: per-denomination facts extracted from a block
//! - `Price`, `Prices`: the joined price table served to callers

pub mod block;
pub mod denom;
pub mod price;

pub use block::{Attribute, Block, BlockData, Event, Log, SupplyEntry, Tx};
pub use denom::{
    RateTable, SupplyTable, AGGREGATE_VOTE_EVENT, BASE_DENOM, DEFAULT_CHAIN_ID,
    EXCHANGE_RATES_KEY,
};
pub use price::{Price, Prices};

//! Block feed and price cache.
//!
//! Turns the observer's block stream into a queryable price table:
//! - `parser`: raw payload → `Block`
//! - `extract`: `Block` → rate table / supply table
//! - `cache`: last-known rates and supply, joined into `Prices` on read
//! - `feeder`: connection owner and poll loop feeding the cache

pub mod cache;
pub mod error;
pub mod extract;
pub mod feeder;
pub mod parser;

pub use cache::{FactCache, FeedStatus, SlotUpdate};
pub use error::{FeedError, FeedResult};
pub use extract::{extract_exchange_rates, extract_supply};
pub use feeder::{Feeder, FeederConfig};
pub use parser::parse_block;

//! Denominations and per-denomination fact tables.

use std::collections::HashMap;

/// The chain's native unit. Always priced at exactly 1.0.
pub const BASE_DENOM: &str = "uluna";

/// Chain the observer subscription asks for by default.
pub const DEFAULT_CHAIN_ID: &str = "columbus-4";

/// Event type carrying a validator's oracle vote.
pub const AGGREGATE_VOTE_EVENT: &str = "aggregate_vote";

/// Attribute of an `aggregate_vote` event holding the rate list.
pub const EXCHANGE_RATES_KEY: &str = "exchange_rates";

/// Exchange rate per denomination, relative to [`BASE_DENOM`].
pub type RateTable = HashMap<String, f64>;

/// Total supply per denomination.
pub type SupplyTable = HashMap<String, u64>;

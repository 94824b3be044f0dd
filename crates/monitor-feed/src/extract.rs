//! Fact extraction from parsed blocks.
//!
//! Rate extraction tolerates absence (most blocks carry no vote) but rejects
//! malformed vote strings. Supply extraction is all-or-nothing.

use crate::error::{FeedError, FeedResult};
use monitor_core::{
    Block, RateTable, SupplyTable, AGGREGATE_VOTE_EVENT, BASE_DENOM, EXCHANGE_RATES_KEY,
};
use tracing::debug;

/// Extract the oracle exchange rates carried by the first `aggregate_vote`.
///
/// Returns an empty table when the block has no vote. Otherwise the rate list
/// `"<number>u<denom>,..."` is parsed in full and [`BASE_DENOM`] is set to 1.0.
pub fn extract_exchange_rates(block: &Block) -> FeedResult<RateTable> {
    let mut rates = RateTable::new();
    let raw = match block.find_event_attribute(AGGREGATE_VOTE_EVENT, EXCHANGE_RATES_KEY) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(rates),
    };

    for piece in raw.split(',') {
        let (amount, denom) = piece.split_once('u').ok_or_else(|| FeedError::MalformedRate {
            piece: piece.to_string(),
            reason: "missing 'u' denom separator".to_string(),
        })?;
        let rate: f64 = amount.parse().map_err(|e| FeedError::MalformedRate {
            piece: piece.to_string(),
            reason: format!("{e}"),
        })?;
        rates.insert(format!("u{denom}"), rate);
    }

    rates.insert(BASE_DENOM.to_string(), 1.0);
    debug!(count = rates.len(), height = ?block.height(), "Parsed exchange rates");
    Ok(rates)
}

/// Extract total supply per denomination.
pub fn extract_supply(block: &Block) -> FeedResult<SupplyTable> {
    block
        .data
        .supply
        .iter()
        .map(|entry| {
            entry
                .amount
                .parse::<u64>()
                .map(|amount| (entry.denom.clone(), amount))
                .map_err(|_| FeedError::MalformedSupply {
                    denom: entry.denom.clone(),
                    amount: entry.amount.clone(),
                })
        })
        .collect()
}

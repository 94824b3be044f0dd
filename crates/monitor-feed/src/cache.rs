//! Last-known facts cache.
//!
//! Holds the most recent rate table and the most recent supply table, each
//! replaced independently. A block that carries only one kind of fact leaves
//! the other slot untouched, so a reader may see supply from block N and rates
//! from block N-1.

use crate::error::{FeedError, FeedResult};
use crate::extract::{extract_exchange_rates, extract_supply};
use chrono::{DateTime, Utc};
use monitor_core::{Block, Price, Prices, RateTable, SupplyTable};
use monitor_telemetry::Metrics;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

const RATES_SLOT: &str = "rates";
const SUPPLY_SLOT: &str = "supply";

/// One cached table with the metadata of the block it came from.
#[derive(Debug)]
struct Slot<T> {
    table: Arc<T>,
    updated_at: DateTime<Utc>,
    recv_mono: Instant,
    height: Option<String>,
}

impl<T> Slot<T> {
    fn new(table: T, height: Option<String>) -> Self {
        Self {
            table: Arc::new(table),
            updated_at: Utc::now(),
            recv_mono: Instant::now(),
            height,
        }
    }

    fn age_ms(&self) -> u64 {
        self.recv_mono.elapsed().as_millis() as u64
    }
}

#[derive(Debug, Default)]
struct Slots {
    rates: Option<Slot<RateTable>>,
    supply: Option<Slot<SupplyTable>>,
}

/// Which slots a block replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotUpdate {
    pub rates: bool,
    pub supply: bool,
}

/// Cache status snapshot, served on the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct FeedStatus {
    /// Both slots populated; `prices()` will succeed.
    pub ready: bool,
    pub rate_denoms: usize,
    pub supply_denoms: usize,
    pub rates_age_ms: Option<u64>,
    pub supply_age_ms: Option<u64>,
    pub rates_height: Option<String>,
    pub supply_height: Option<String>,
    pub rates_updated_at: Option<DateTime<Utc>>,
    pub supply_updated_at: Option<DateTime<Utc>>,
}

/// Rate and supply cache shared between the poll loop and readers.
///
/// The writer side is held only for a slot assignment; readers clone the
/// `Arc`s out and join outside the lock.
#[derive(Debug, Default)]
pub struct FactCache {
    slots: RwLock<Slots>,
}

impl FactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract both fact kinds from `block` and install the non-empty ones.
    ///
    /// A malformed field abandons only its own slot update.
    pub fn apply_block(&self, block: &Block) -> SlotUpdate {
        let height = block.height().map(str::to_string);
        let mut update = SlotUpdate::default();

        match extract_exchange_rates(block) {
            Ok(rates) if !rates.is_empty() => {
                self.install_rates(rates, height.clone());
                update.rates = true;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, height = ?height, "Failed to extract exchange rates");
                Metrics::extract_error(RATES_SLOT);
            }
        }

        match extract_supply(block) {
            Ok(supply) if !supply.is_empty() => {
                self.install_supply(supply, height.clone());
                update.supply = true;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, height = ?height, "Failed to extract supply");
                Metrics::extract_error(SUPPLY_SLOT);
            }
        }

        update
    }

    /// Replace the rate slot.
    pub fn install_rates(&self, rates: RateTable, height: Option<String>) {
        let denoms = rates.len();
        self.slots.write().rates = Some(Slot::new(rates, height));
        Metrics::slot_updated(RATES_SLOT, denoms);
        debug!(denoms, "Installed rate table");
    }

    /// Replace the supply slot.
    pub fn install_supply(&self, supply: SupplyTable, height: Option<String>) {
        let denoms = supply.len();
        self.slots.write().supply = Some(Slot::new(supply, height));
        Metrics::slot_updated(SUPPLY_SLOT, denoms);
        debug!(denoms, "Installed supply table");
    }

    pub fn has_rates(&self) -> bool {
        self.slots.read().rates.is_some()
    }

    /// Join cached supply with cached rates.
    ///
    /// One entry per supply denomination; a denomination the oracle does not
    /// quote is priced at 0.
    pub fn prices(&self) -> FeedResult<Prices> {
        let (rates, supply) = {
            let slots = self.slots.read();
            let rates = slots.rates.as_ref().ok_or(FeedError::NoRates)?;
            let supply = slots.supply.as_ref().ok_or(FeedError::NoSupply)?;
            (Arc::clone(&rates.table), Arc::clone(&supply.table))
        };

        let prices = supply
            .iter()
            .map(|(denom, &volume)| {
                let rate = rates.get(denom).copied().unwrap_or_else(|| {
                    warn!(%denom, "Denom has supply but no oracle rate, pricing at 0");
                    Metrics::untracked_denom();
                    0.0
                });
                Price::new(denom.as_str(), rate, volume)
            })
            .collect();

        Ok(Prices::new(prices))
    }

    pub fn status(&self) -> FeedStatus {
        let slots = self.slots.read();
        let rates = slots.rates.as_ref();
        let supply = slots.supply.as_ref();

        FeedStatus {
            ready: rates.is_some() && supply.is_some(),
            rate_denoms: rates.map_or(0, |s| s.table.len()),
            supply_denoms: supply.map_or(0, |s| s.table.len()),
            rates_age_ms: rates.map(Slot::age_ms),
            supply_age_ms: supply.map(Slot::age_ms),
            rates_height: rates.and_then(|s| s.height.clone()),
            supply_height: supply.and_then(|s| s.height.clone()),
            rates_updated_at: rates.map(|s| s.updated_at),
            supply_updated_at: supply.map(|s| s.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_block;
    use std::thread;
    use tokio_test::{assert_err, assert_ok};

    fn rates(entries: &[(&str, f64)]) -> RateTable {
        entries.iter().map(|(d, r)| (d.to_string(), *r)).collect()
    }

    fn supply(entries: &[(&str, u64)]) -> SupplyTable {
        entries.iter().map(|(d, a)| (d.to_string(), *a)).collect()
    }

    fn sorted(prices: Prices) -> Vec<Price> {
        let mut list = prices.prices;
        list.sort_by(|a, b| a.denom.cmp(&b.denom));
        list
    }

    #[test]
    fn test_join_rates_and_supply() {
        let cache = FactCache::new();
        cache.install_rates(rates(&[("uluna", 1.0), ("ukrw", 2.0)]), None);
        cache.install_supply(supply(&[("uluna", 100), ("ukrw", 50)]), None);

        let prices = sorted(assert_ok!(cache.prices()));
        assert_eq!(
            prices,
            vec![Price::new("ukrw", 2.0, 50), Price::new("uluna", 1.0, 100)]
        );
    }

    #[test]
    fn test_untracked_denom_priced_at_zero() {
        let cache = FactCache::new();
        cache.install_rates(rates(&[("uluna", 1.0)]), None);
        cache.install_supply(supply(&[("uluna", 100), ("umnt", 7)]), None);

        let prices = assert_ok!(cache.prices());
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get("umnt"), Some(&Price::new("umnt", 0.0, 7)));
    }

    #[test]
    fn test_empty_cache_reports_no_rates_first() {
        let cache = FactCache::new();
        assert!(matches!(cache.prices(), Err(FeedError::NoRates)));

        cache.install_supply(supply(&[("uluna", 1)]), None);
        assert!(matches!(cache.prices(), Err(FeedError::NoRates)));
    }

    #[test]
    fn test_rates_without_supply_reports_no_supply() {
        let cache = FactCache::new();
        cache.install_rates(rates(&[("uluna", 1.0)]), None);
        let err = assert_err!(cache.prices());
        assert!(matches!(err, FeedError::NoSupply));
        assert!(err.is_not_ready());
    }

    #[test]
    fn test_block_without_vote_keeps_previous_rates() {
        let cache = FactCache::new();
        let vote = parse_block(
            br#"{"data": {"txs": [{"height": "10", "logs": [{"events": [
                {"type": "aggregate_vote", "attributes": [
                    {"key": "exchange_rates", "value": "2ukrw"}
                ]}
            ]}]}], "supply": [{"denom": "ukrw", "amount": "50"}]}}"#,
        )
        .unwrap();
        let update = cache.apply_block(&vote);
        assert_eq!(update, SlotUpdate { rates: true, supply: true });

        let supply_only = parse_block(
            br#"{"data": {"txs": [{"height": "11"}], "supply": [{"denom": "ukrw", "amount": "60"}]}}"#,
        )
        .unwrap();
        let update = cache.apply_block(&supply_only);
        assert_eq!(update, SlotUpdate { rates: false, supply: true });

        let prices = assert_ok!(cache.prices());
        assert_eq!(prices.get("ukrw"), Some(&Price::new("ukrw", 2.0, 60)));

        let status = cache.status();
        assert!(status.ready);
        assert_eq!(status.rates_height.as_deref(), Some("10"));
        assert_eq!(status.supply_height.as_deref(), Some("11"));
    }

    #[test]
    fn test_malformed_supply_leaves_slot_untouched() {
        let cache = FactCache::new();
        cache.install_supply(supply(&[("uluna", 100)]), None);

        let bad = parse_block(
            br#"{"data": {"supply": [{"denom": "uluna", "amount": "notanumber"}]}}"#,
        )
        .unwrap();
        assert_eq!(cache.apply_block(&bad), SlotUpdate::default());

        cache.install_rates(rates(&[("uluna", 1.0)]), None);
        let prices = assert_ok!(cache.prices());
        assert_eq!(prices.get("uluna").map(|p| p.volume), Some(100));
    }

    #[test]
    fn test_malformed_rates_leave_supply_update_intact() {
        let cache = FactCache::new();
        let block = parse_block(
            br#"{"data": {"txs": [{"logs": [{"events": [
                {"type": "aggregate_vote", "attributes": [
                    {"key": "exchange_rates", "value": "abcukrw"}
                ]}
            ]}]}], "supply": [{"denom": "uluna", "amount": "5"}]}}"#,
        )
        .unwrap();

        assert_eq!(cache.apply_block(&block), SlotUpdate { rates: false, supply: true });
        assert!(!cache.has_rates());
    }

    #[test]
    fn test_status_of_cold_cache() {
        let status = FactCache::new().status();
        assert!(!status.ready);
        assert_eq!(status.rate_denoms, 0);
        assert!(status.rates_age_ms.is_none());
        assert!(status.supply_updated_at.is_none());
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let cache = Arc::new(FactCache::new());
        cache.install_rates(rates(&[("uluna", 1.0)]), None);
        cache.install_supply(supply(&[("uluna", 1)]), None);

        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..500u64 {
                    cache.install_supply(supply(&[("uluna", i), ("ukrw", i)]), None);
                    cache.install_rates(rates(&[("uluna", 1.0), ("ukrw", i as f64)]), None);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let prices = cache.prices().unwrap();
                        // Every entry comes from one internally consistent supply table
                        assert!(prices.len() == 1 || prices.len() == 2);
                        if let (Some(a), Some(b)) = (prices.get("uluna"), prices.get("ukrw")) {
                            assert_eq!(a.volume, b.volume);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}

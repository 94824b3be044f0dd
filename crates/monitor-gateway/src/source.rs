//! Read side the gateway serves from.

use monitor_core::Prices;
use monitor_feed::{FactCache, FeedResult, FeedStatus, Feeder};

/// Anything that can answer a price query from cached state.
pub trait PriceSource: Send + Sync + 'static {
    fn prices(&self) -> FeedResult<Prices>;
    fn status(&self) -> FeedStatus;
}

impl PriceSource for Feeder {
    fn prices(&self) -> FeedResult<Prices> {
        Feeder::prices(self)
    }

    fn status(&self) -> FeedStatus {
        Feeder::status(self)
    }
}

impl PriceSource for FactCache {
    fn prices(&self) -> FeedResult<Prices> {
        FactCache::prices(self)
    }

    fn status(&self) -> FeedStatus {
        FactCache::status(self)
    }
}

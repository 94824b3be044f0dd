//! Price table served to callers.

use serde::{Deserialize, Serialize};

/// Derived price of one denomination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub denom: String,
    /// Oracle exchange rate; 0 when the oracle does not track the denom.
    pub price: f64,
    /// Total supply.
    pub volume: u64,
}

impl Price {
    pub fn new(denom: impl Into<String>, price: f64, volume: u64) -> Self {
        Self {
            denom: denom.into(),
            price,
            volume,
        }
    }
}

/// Response body of a price query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    pub prices: Vec<Price>,
}

impl Prices {
    pub fn new(prices: Vec<Price>) -> Self {
        Self { prices }
    }

    /// Look up the entry for `denom`.
    pub fn get(&self, denom: &str) -> Option<&Price> {
        self.prices.iter().find(|p| p.denom == denom)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
